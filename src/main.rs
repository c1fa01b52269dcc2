#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lecture_portal::run().await
}
