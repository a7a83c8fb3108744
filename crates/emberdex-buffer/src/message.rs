/// A unit of index work carrying its own completion signal.
///
/// The buffer invokes [`done`](Completable::done) exactly once per offered
/// message, synchronously, whether or not the message was admitted. The
/// signal means "the producer may proceed", never "stored" or "processed".
/// Payload content is opaque to the buffer.
pub trait Completable {
    fn done(&self);
}
