#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spread_quiz_backend::run().await
}
