use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match spread_quiz_client::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
