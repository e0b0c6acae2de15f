#[tokio::main]
async fn main() {
    let code = assetscan_lib::run().await;
    std::process::exit(code);
}
