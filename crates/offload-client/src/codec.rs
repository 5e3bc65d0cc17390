//! Decoding of raw command responses into structured values.

use serde::de::DeserializeOwned;

use offload_core::{ClientError, ClientResult};

/// Decode a raw response body into `T`.
///
/// Pure beyond parsing; the codec itself never retries, but calls wrapped in
/// a [`crate::RetryPolicy`] cover decode failures along with transport ones.
///
/// # Errors
///
/// Returns [`ClientError::MalformedResponse`] when the body is not valid
/// structured data for `T`.
pub fn decode<T: DeserializeOwned>(command: &'static str, raw: &str) -> ClientResult<T> {
    serde_json::from_str(raw).map_err(|source| ClientError::MalformedResponse { command, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use offload_core::StagedFile;

    #[test]
    fn decodes_structured_values() {
        let staged: StagedFile = decode("upload_input", r#"{"path": "/remote/in.txt"}"#).unwrap();
        assert_eq!(staged.path, "/remote/in.txt");

        let scalar: String = decode("input_path", r#""/remote/in.txt""#).unwrap();
        assert_eq!(scalar, "/remote/in.txt");
    }

    #[test]
    fn malformed_bodies_carry_the_command() {
        let result: ClientResult<StagedFile> = decode("upload_input", "<html>oops</html>");
        assert!(matches!(
            result,
            Err(ClientError::MalformedResponse { command: "upload_input", .. })
        ));
    }
}
