#[tokio::main]
async fn main() {
    ticketing_backend::run().await;
}
