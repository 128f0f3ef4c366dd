use mapping_uploader::{app, clean_logger, init_local_logger};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = init_local_logger() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }

    let res = app::run().await;
    if let Err(err) = res {
        clean_logger();
        log::error!("Error: {err:#}");
        log::logger().flush();
        std::process::exit(1);
    }
}
