//! Virtual file system protocol.
//!
//! `load` asks for a file by path and is answered with `file`, carrying a
//! handle to the file's contents. `get_tag` asks which storage tag a VFS
//! instance serves and is answered with `tag`.

crate::protocol! {
    name = "os.protocol.vfs",
    style = Mailbox,
    tags {
        /// Request a file.
        Load,
        /// Reply to `load`.
        File,
        /// Request the instance's storage tag.
        GetTag,
        /// Reply to `get_tag`.
        Tag,
    }
}
