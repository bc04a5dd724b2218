//! Message trait for values flowing through a pipeline.

/// A marker trait for values that can travel between stages.
///
/// Messages must be `Send + Sync + 'static` so that a stage can hold them
/// across suspension points on a multi-threaded runtime.
///
/// # Example
///
/// ```rust,ignore
/// struct Handshake { conn: Connection, protocol: String }
///
/// impl Message for Handshake {}
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` is not a valid Message",
    label = "must be `Send + Sync + 'static`",
    note = "Everything passed between Portier stages must be thread-safe and static."
)]
pub trait Message: Send + Sync + 'static {}

impl Message for () {}
impl Message for String {}
impl<T: Message> Message for Box<T> {}
impl<T: Message> Message for std::sync::Arc<T> {}
impl<T: Message> Message for Option<T> {}
