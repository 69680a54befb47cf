/// Terminal result for one record. Produced exactly once per record and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub ok: bool,
    pub external_id: String,
    /// Status of the final attempt, `None` when no response arrived.
    pub status: Option<u16>,
    /// Duration of the final attempt only.
    pub elapsed_ms: Option<u64>,
    pub returned_id: String,
    pub error: String,
}

impl Outcome {
    #[must_use]
    pub fn success(external_id: &str, status: u16, elapsed_ms: u64, returned_id: String) -> Self {
        Self {
            ok: true,
            external_id: external_id.to_string(),
            status: Some(status),
            elapsed_ms: Some(elapsed_ms),
            returned_id,
            error: String::new(),
        }
    }

    #[must_use]
    pub fn failure(
        external_id: &str,
        status: Option<u16>,
        elapsed_ms: Option<u64>,
        returned_id: String,
        error: String,
    ) -> Self {
        Self {
            ok: false,
            external_id: external_id.to_string(),
            status,
            elapsed_ms,
            returned_id,
            error,
        }
    }
}
