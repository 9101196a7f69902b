use chrono::Utc;

/// Time source for the signed `Date` header.
///
/// Implementations render RFC 1123 GMT timestamps, e.g.
/// `Tue, 01 Jan 2019 00:00:00 GMT`. Successive calls may return different
/// values; callers capture one value per request and reuse it for both the
/// `Date` header and the signable string.
pub trait Clock: Send + Sync {
    fn rfc1123_now(&self) -> String;
}

/// Reads the system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn rfc1123_now(&self) -> String {
        Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string()
    }
}

/// Always returns the same timestamp. Test double for deterministic
/// signatures.
pub struct FixedClock(pub String);

impl Clock for FixedClock {
    fn rfc1123_now(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_matches_rfc1123_shape() {
        let ts = SystemClock.rfc1123_now();
        assert_eq!(ts.len(), "Tue, 01 Jan 2019 00:00:00 GMT".len());
        assert!(ts.ends_with(" GMT"));
        assert_eq!(ts.find(','), Some(3));
    }

    #[test]
    fn fixed_clock_returns_its_timestamp() {
        let clock = FixedClock("Tue, 01 Jan 2019 00:00:00 GMT".into());
        assert_eq!(clock.rfc1123_now(), "Tue, 01 Jan 2019 00:00:00 GMT");
        assert_eq!(clock.rfc1123_now(), "Tue, 01 Jan 2019 00:00:00 GMT");
    }
}
