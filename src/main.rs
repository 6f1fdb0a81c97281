#[tokio::main(flavor = "multi_thread")]
async fn main() {
    melee_overlay_control::run().await;
}
