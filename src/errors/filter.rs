use super::EncodingError;

/// A log filter could not be built from the requested event names and
/// indexed-argument values.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// No tracked contract declares an event with this name.
    #[error("unknown event {name:?}")]
    UnknownEvent { name: String },

    /// The argument is not an indexed input of the first requested event.
    #[error("{argument:?} is not an indexed input of event {event:?}")]
    UnknownIndexedArgument { event: String, argument: String },

    /// Indexed values were supplied without naming an event to bind them to.
    #[error("indexed arguments require at least one event name")]
    IndexedArgsWithoutEvent,

    /// The event declares more indexed inputs than a log can carry topics.
    #[error("event {event:?} has {indexed} indexed inputs, at most 3 fit in a log")]
    TooManyTopics { event: String, indexed: usize },

    /// An indexed value could not be encoded for its declared type.
    #[error("cannot encode indexed argument {argument:?}: {source}")]
    Encoding {
        argument: String,
        #[source]
        source: EncodingError,
    },
}
