#[tokio::main]
async fn main() {
    app::application().run().await;
}
