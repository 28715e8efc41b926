use iaflat_derive::iaflat_error;
use std::borrow::Cow;

#[iaflat_error]
pub enum MoveError {
    #[error("I/O failure{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open(path: &str) -> Result<std::fs::File, MoveError> {
    std::fs::File::open(path).context("Opening source asset")
}

fn main() {
    let err = open("/definitely/not/here.png").unwrap_err();
    assert!(err.to_string().contains("Opening source asset"));

    let internal: MoveError = "namer exhausted".into();
    assert!(matches!(internal, MoveError::Internal { .. }));

    let io: MoveError = std::io::Error::other("boom").into();
    let io: Result<(), MoveError> = Err(io).context("Renaming");
    assert!(io.unwrap_err().to_string().contains("(Renaming)"));
}
