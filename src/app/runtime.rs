use std::io;

/// Runtime hosting the search subprocesses and their reader tasks.
///
/// Must be multi-threaded: the consumer only polls the channel and never
/// drives the runtime itself.
pub fn build_runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("grepnav-search")
        .enable_all()
        .build()
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create multi-thread tokio runtime");
            e
        })
}
