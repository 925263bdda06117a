#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rep_trainer_lib::run(std::env::args().skip(1)).await
}
