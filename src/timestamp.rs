use chrono::{DateTime, Utc};

/// UTC instant persisted alongside sequence rows and user events.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Timestamp(value)
    }
}

// nanoseconds since the epoch, i64 covers 1677..2262
impl<C> minicbor::Encode<C> for Timestamp {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        let nanos = self.0.timestamp_nanos_opt().ok_or_else(|| {
            minicbor::encode::Error::message("timestamp out of range for nanosecond encoding")
        })?;
        e.i64(nanos)?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for Timestamp {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        Ok(Timestamp(DateTime::from_timestamp_nanos(d.i64()?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn survives_cbor_encoding() {
        let stamp = Timestamp::now();

        let encoding = minicbor::to_vec(stamp).unwrap();
        let decoded: Timestamp = minicbor::decode(&encoding).unwrap();

        assert_eq!(stamp, decoded);
    }
}
