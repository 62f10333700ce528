use crate::framebuffer::AttachmentPoint;
use crate::states::RenderStateKind;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(
        display = "Index {} of {:?} is out of range (max {}).",
        index, kind, max
    )]
    IndexOutOfRange {
        kind: RenderStateKind,
        index: usize,
        max: usize,
    },
    #[fail(display = "Pass {} of LOD {} has not been populated.", pass, lod)]
    PassOutOfRange { lod: usize, pass: usize },
    #[fail(display = "OpenGL implementation doesn\'t support {}.", _0)]
    Requirement(String),
    #[fail(display = "Failed to link program, errors: \n{}.", _0)]
    ProgramLink(String),
    #[fail(display = "Framebuffer is incomplete: {}.", _0)]
    FramebufferIncomplete(String),
    #[fail(display = "Attachment {:?} is invalid: {}.", _0, _1)]
    InvalidAttachment(AttachmentPoint, String),
    #[fail(display = "Too many color attachments.")]
    TooManyColorAttachments,
    #[fail(display = "{} is invalid.", _0)]
    HandleInvalid(String),
    #[fail(display = "{} could not be a child of its own descendant.", _0)]
    TransformCycle(String),
    #[fail(
        display = "Rendering {} samples a texture produced by the later rendering {}.",
        _0, _1
    )]
    RenderingOrder(usize, usize),
    #[fail(display = "Backend: {}", _0)]
    Backend(String),
    #[fail(display = "Serialization: {}", _0)]
    Serialization(String),
    #[fail(display = "IO: {}", _0)]
    Io(String),
}

pub type Result<T> = ::std::result::Result<T, Error>;

impl From<::std::io::Error> for Error {
    fn from(err: ::std::io::Error) -> Error {
        Error::Io(format!("{}", err))
    }
}

impl From<::serde_json::Error> for Error {
    fn from(err: ::serde_json::Error) -> Error {
        Error::Serialization(format!("{}", err))
    }
}

impl From<::bincode::Error> for Error {
    fn from(err: ::bincode::Error) -> Error {
        Error::Serialization(format!("{}", err))
    }
}
