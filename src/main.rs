use image_feed::frameworks::cli;

#[tokio::main]
async fn main() {
    cli::run().await;
}
