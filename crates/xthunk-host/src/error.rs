use thiserror::Error;
use xthunk_protocol::DispatchError;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to load {name}: {source}")]
    LibraryLoad {
        name: String,
        #[source]
        source: libloading::Error,
    },

    #[error("host library has no entry point {0}")]
    MissingEntry(&'static str),

    #[error("OpenXR runtime is not configured")]
    NoOpenxrRuntime,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
