pub mod document;
pub mod storage;
