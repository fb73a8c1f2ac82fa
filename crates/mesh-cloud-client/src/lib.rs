//! # mesh-cloud-client: typed clients for the SoundMesh cloud services
//!
//! Each service is a thin set of typed methods composed over one shared
//! [`BlockingRpcClient`](shared_jsonrpc::BlockingRpcClient): no transport
//! concerns leak into the method sets, and one channel carries every
//! service. The blocking HTTP adapter in [`http`] is the usual transport
//! for cloud endpoints; any [`MessageSender`](shared_jsonrpc::MessageSender)
//! works.
//!
//! ```ignore
//! let sender = Arc::new(HttpMessageSender::new("https://cloud.example/jsonrpc")?);
//! let registry = Arc::new(PendingCallRegistry::new());
//! let client = Arc::new(RpcClient::new(
//!     sender.clone(),
//!     Arc::clone(&registry),
//!     Arc::new(TokioScheduler::current()),
//!     ClientConfig::with_default_timeout_ms(30_000),
//! ));
//! sender.bind_dispatcher(Arc::new(MessageDispatcher::new(
//!     registry,
//!     MethodTable::new(),
//!     sender.clone(),
//! )));
//!
//! let library = LibraryClient::new(BlockingRpcClient::new(client));
//! let track = library.get_track("track-1", None)?;
//! ```

pub mod core;
pub mod http;
pub mod library;
pub mod scrobble;
pub mod types;

pub use crate::core::CoreServiceClient;
pub use http::HttpMessageSender;
pub use library::LibraryClient;
pub use scrobble::ScrobbleClient;
pub use types::{
    AddDeviceRequest, AddDeviceResponse, ChunkedRequest, FindServicesRequest,
    FindServicesResponse, ItemAttributes, LibraryItem, PlayedItem, ServiceInformation,
};
