use std::error::Error;

/// Renders an error and every `source()` below it, one per line.
pub fn format_error_chain<E: Error + ?Sized>(error: &E) -> String {
    let mut chain = vec![error.to_string()];
    let mut source = error.source();

    while let Some(err) = source {
        chain.push(format!("  caused by: {}", err));
        source = err.source();
    }

    chain.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.json missing");
        let err = CoreError::from(io);
        let rendered = format_error_chain(&err);
        assert!(rendered.starts_with("io error: config.json missing"));
    }

    #[test]
    fn chain_of_leaf_error_is_single_line() {
        let err = CoreError::Config("bad".into());
        assert_eq!(format_error_chain(&err), "config error: bad");
    }
}
