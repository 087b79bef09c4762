/// How the file reaches the target service (§4.5 step 2, §9's preference
/// for modeling transport as data rather than a boolean flag).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UploadTransport {
    /// File bytes travel over the wire.
    ByValue,
    /// Only the path is sent; the target service reads it directly
    /// ("symlink mode"). Requires the target to have filesystem access to
    /// the source library.
    ByReference,
}
