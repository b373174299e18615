/// Fallible conversion that has to touch the filesystem (or anything else
/// asynchronous) before it can produce a value.
///
/// Used for the types that are built by reading a file, such as a
/// [`ContentHash`](crate::fingerprint::ContentHash) or a
/// [`TrackedEntry`](crate::tracking::TrackedEntry).
///
/// # Examples
///
/// ```rust,ignore
/// use std::path::Path;
///
/// use impostr::ext::AsyncTryFrom;
/// use impostr::fingerprint::ContentHash;
///
/// # compio::runtime::Runtime::new().unwrap().block_on(async {
/// let result = ContentHash::async_try_from(Path::new("Cargo.toml")).await;
/// assert!(result.is_ok());
/// # });
/// ```
pub trait AsyncTryFrom<T>: Sized {
    /// The error type that can occur during conversion.
    type Error;

    /// Performs the fallible asynchronous conversion from `T` to `Self`.
    async fn async_try_from(value: T) -> Result<Self, Self::Error>;
}

/// Async counterpart to `TryInto<T>`.
pub trait AsyncTryInto<T> {
    type Error;

    async fn async_try_into(self) -> Result<T, Self::Error>;
}

impl<T, U> AsyncTryInto<U> for T
where
    U: AsyncTryFrom<T>,
{
    type Error = U::Error;

    async fn async_try_into(self) -> Result<U, Self::Error> {
        U::async_try_from(self).await
    }
}
