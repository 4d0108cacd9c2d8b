//! Network probe adapters: DNS, TLS certificates, antivirus.

mod clamd;
mod resolver;
mod tls_inspector;

pub use clamd::ClamdScanner;
pub use resolver::TokioHostResolver;
pub use tls_inspector::RustlsCertificateInspector;
