use std::error::Error;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use tokio_util::bytes;

use crate::types::RowValues;

type BoxError = Box<dyn Error + Sync + Send>;

/// Borrowed `RowValues` in the shape tokio-postgres binds.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    #[must_use]
    pub fn convert(params: &'a [RowValues]) -> Params<'a> {
        let mut references = Vec::with_capacity(params.len());
        for p in params {
            references.push(p as &(dyn ToSql + Sync));
        }
        Params { references }
    }

    #[must_use]
    pub fn as_refs(&self) -> &[&(dyn ToSql + Sync)] {
        &self.references
    }
}

impl ToSql for RowValues {
    fn to_sql(&self, ty: &Type, out: &mut bytes::BytesMut) -> Result<IsNull, BoxError> {
        // Domains (e.g. information_schema.sql_identifier) bind as their base type.
        if let Kind::Domain(base) = ty.kind() {
            return self.to_sql(base, out);
        }
        match self {
            RowValues::Int(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                _ => (*i).to_sql(ty, out),
            },
            RowValues::Float(f) => match *ty {
                #[allow(clippy::cast_possible_truncation)]
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => (*f).to_sql(ty, out),
            },
            RowValues::Text(s) => s.to_sql(ty, out),
            RowValues::Bool(b) => (*b).to_sql(ty, out),
            RowValues::Timestamp(dt) => match *ty {
                Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
                Type::DATE => dt.date().to_sql(ty, out),
                _ => dt.to_sql(ty, out),
            },
            RowValues::Null => Ok(IsNull::Yes),
            RowValues::JSON(jsval) => jsval.to_sql(ty, out),
            RowValues::Blob(bytes) => bytes.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        if let Kind::Domain(base) = ty.kind() {
            return <RowValues as ToSql>::accepts(base);
        }
        matches!(
            *ty,
            Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::BOOL
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

impl<'a> FromSql<'a> for RowValues {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        if let Kind::Domain(base) = ty.kind() {
            return <RowValues as FromSql>::from_sql(base, raw);
        }
        let value = match *ty {
            Type::BOOL => RowValues::Bool(bool::from_sql(ty, raw)?),
            Type::INT2 => RowValues::Int(i64::from(i16::from_sql(ty, raw)?)),
            Type::INT4 => RowValues::Int(i64::from(i32::from_sql(ty, raw)?)),
            Type::INT8 => RowValues::Int(i64::from_sql(ty, raw)?),
            Type::OID => RowValues::Int(i64::from(u32::from_sql(ty, raw)?)),
            Type::FLOAT4 => RowValues::Float(f64::from(f32::from_sql(ty, raw)?)),
            Type::FLOAT8 => RowValues::Float(f64::from_sql(ty, raw)?),
            Type::TIMESTAMP => RowValues::Timestamp(NaiveDateTime::from_sql(ty, raw)?),
            Type::TIMESTAMPTZ => {
                RowValues::Timestamp(DateTime::<Utc>::from_sql(ty, raw)?.naive_utc())
            }
            Type::JSON | Type::JSONB => RowValues::JSON(Value::from_sql(ty, raw)?),
            Type::BYTEA => RowValues::Blob(Vec::<u8>::from_sql(ty, raw)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                RowValues::Text(String::from_sql(ty, raw)?)
            }
            // Enum labels travel as text; anything else is handed back undecoded.
            _ if matches!(ty.kind(), Kind::Enum(_)) => {
                RowValues::Text(std::str::from_utf8(raw)?.to_owned())
            }
            _ => RowValues::Blob(raw.to_vec()),
        };
        Ok(value)
    }

    fn from_sql_null(_ty: &Type) -> Result<Self, BoxError> {
        Ok(RowValues::Null)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_narrow_to_the_column_width() {
        let mut out = bytes::BytesMut::new();
        let is_null = RowValues::Int(7).to_sql(&Type::INT4, &mut out).unwrap();
        assert!(matches!(is_null, IsNull::No));
        assert_eq!(out.as_ref(), &7i32.to_be_bytes());

        let mut out = bytes::BytesMut::new();
        assert!(RowValues::Int(i64::from(i32::MAX) + 1).to_sql(&Type::INT4, &mut out).is_err());
    }

    #[test]
    fn null_binds_as_sql_null() {
        let mut out = bytes::BytesMut::new();
        assert!(matches!(RowValues::Null.to_sql(&Type::TEXT, &mut out).unwrap(), IsNull::Yes));
    }

    #[test]
    fn decodes_binary_values() {
        assert_eq!(
            <RowValues as FromSql>::from_sql(&Type::BOOL, &[1]).unwrap(),
            RowValues::Bool(true)
        );
        assert_eq!(
            <RowValues as FromSql>::from_sql(&Type::INT4, &42i32.to_be_bytes()).unwrap(),
            RowValues::Int(42)
        );
        assert_eq!(
            <RowValues as FromSql>::from_sql(&Type::TEXT, b"0001_init").unwrap(),
            RowValues::Text("0001_init".into())
        );
        assert_eq!(<RowValues as FromSql>::from_sql_null(&Type::TEXT).unwrap(), RowValues::Null);
    }

    #[test]
    fn accepts_the_supported_types() {
        assert!(<RowValues as ToSql>::accepts(&Type::NAME));
        assert!(!<RowValues as ToSql>::accepts(&Type::POINT));
    }
}
