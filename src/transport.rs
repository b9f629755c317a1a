use crate::error::{HarvestError, Result};
use crate::types::{AppId, RequestOutcome};

/// Flow-control verdict for one remote call, derived from the status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Absent,
    Skip,
    Halted,
}

impl Verdict {
    /// The outcome to record when there is no payload to parse. `None`
    /// means the caller proceeds to extraction.
    pub fn without_payload<T>(self) -> Option<RequestOutcome<T>> {
        match self {
            Verdict::Success => None,
            Verdict::Absent => Some(RequestOutcome::Absent),
            Verdict::Skip => Some(RequestOutcome::Skip),
            Verdict::Halted => Some(RequestOutcome::Halted),
        }
    }
}

/// Maps a response status to a verdict: 200 → Success, 404 → Absent,
/// 429 → Halted, 503 → Skip. Anything else is outside the source contracts
/// and fails the run with the source and app attached.
pub fn classify(source_label: &'static str, appid: AppId, status: u16) -> Result<Verdict> {
    match status {
        200 => Ok(Verdict::Success),
        404 => Ok(Verdict::Absent),
        429 => Ok(Verdict::Halted),
        503 => Ok(Verdict::Skip),
        status => Err(HarvestError::UnexpectedStatus { source_label, appid, status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognized_statuses_map_to_exactly_one_verdict() {
        assert_eq!(classify("t", 620, 200).unwrap(), Verdict::Success);
        assert_eq!(classify("t", 620, 404).unwrap(), Verdict::Absent);
        assert_eq!(classify("t", 620, 429).unwrap(), Verdict::Halted);
        assert_eq!(classify("t", 620, 503).unwrap(), Verdict::Skip);
    }

    #[test]
    fn unlisted_statuses_are_fatal() {
        for status in [301, 400, 500, 502] {
            let err = classify("t", 730, status).unwrap_err();
            match err {
                HarvestError::UnexpectedStatus { source_label, appid, status: got } => {
                    assert_eq!(source_label, "t");
                    assert_eq!(appid, 730);
                    assert_eq!(got, status);
                }
                other => panic!("expected UnexpectedStatus, got {other:?}"),
            }
        }
    }

    #[test]
    fn only_success_proceeds_to_extraction() {
        assert!(Verdict::Success.without_payload::<()>().is_none());
        assert_eq!(Verdict::Absent.without_payload::<()>(), Some(RequestOutcome::Absent));
        assert_eq!(Verdict::Skip.without_payload::<()>(), Some(RequestOutcome::Skip));
        assert_eq!(Verdict::Halted.without_payload::<()>(), Some(RequestOutcome::Halted));
    }
}
