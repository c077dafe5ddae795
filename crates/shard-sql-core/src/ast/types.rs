//! SQL data types.

use std::fmt;

use serde::Serialize;

use super::ObjectName;

/// Length of a character or binary type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CharLength {
    Fixed(u64),
    /// `MAX`
    Max,
}

impl fmt::Display for CharLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Max => f.write_str("MAX"),
        }
    }
}

/// A raw type argument as written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TypeArg {
    Number(u64),
    Max,
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Max => f.write_str("MAX"),
        }
    }
}

/// SQL data types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Bit,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Decimal {
        precision: Option<u64>,
        scale: Option<u64>,
    },
    Numeric {
        precision: Option<u64>,
        scale: Option<u64>,
    },
    Money,
    SmallMoney,
    Float(Option<u64>),
    Real,
    DoublePrecision,
    Boolean,
    Date,
    Time(Option<u64>),
    DateTime,
    DateTime2(Option<u64>),
    DateTimeOffset(Option<u64>),
    SmallDateTime,
    Timestamp,
    Char(Option<CharLength>),
    VarChar(Option<CharLength>),
    NChar(Option<CharLength>),
    NVarChar(Option<CharLength>),
    Text,
    NText,
    Binary(Option<CharLength>),
    VarBinary(Option<CharLength>),
    Image,
    UniqueIdentifier,
    Xml,
    SqlVariant,
    /// A user-defined or unrecognized type, kept verbatim.
    Custom { name: ObjectName, args: Vec<TypeArg> },
}

fn single_number(args: &[TypeArg]) -> Option<Option<u64>> {
    match args {
        [] => Some(None),
        [TypeArg::Number(n)] => Some(Some(*n)),
        _ => None,
    }
}

fn precision_scale(args: &[TypeArg]) -> Option<(Option<u64>, Option<u64>)> {
    match args {
        [] => Some((None, None)),
        [TypeArg::Number(p)] => Some((Some(*p), None)),
        [TypeArg::Number(p), TypeArg::Number(s)] => Some((Some(*p), Some(*s))),
        _ => None,
    }
}

fn length(args: &[TypeArg]) -> Option<Option<CharLength>> {
    match args {
        [] => Some(None),
        [TypeArg::Number(n)] => Some(Some(CharLength::Fixed(*n))),
        [TypeArg::Max] => Some(Some(CharLength::Max)),
        _ => None,
    }
}

fn no_args(args: &[TypeArg], ty: DataType) -> Option<DataType> {
    args.is_empty().then_some(ty)
}

impl DataType {
    /// Resolves a type name and its arguments.
    ///
    /// Built-in names are matched case-insensitively; anything else, including
    /// a built-in name with arguments it does not take, becomes
    /// [`DataType::Custom`].
    #[must_use]
    pub fn resolve(name: ObjectName, args: Vec<TypeArg>) -> Self {
        let builtin = match name.0.as_slice() {
            [single] if single.quote_style.is_none() => Self::builtin(&single.value, &args),
            _ => None,
        };
        builtin.unwrap_or(Self::Custom { name, args })
    }

    fn builtin(name: &str, args: &[TypeArg]) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "BIT" => no_args(args, Self::Bit),
            "TINYINT" => no_args(args, Self::TinyInt),
            "SMALLINT" => no_args(args, Self::SmallInt),
            "INT" | "INTEGER" => no_args(args, Self::Int),
            "BIGINT" => no_args(args, Self::BigInt),
            "DECIMAL" | "DEC" => precision_scale(args).map(|(precision, scale)| Self::Decimal { precision, scale }),
            "NUMERIC" => precision_scale(args).map(|(precision, scale)| Self::Numeric { precision, scale }),
            "MONEY" => no_args(args, Self::Money),
            "SMALLMONEY" => no_args(args, Self::SmallMoney),
            "FLOAT" => single_number(args).map(Self::Float),
            "REAL" => no_args(args, Self::Real),
            "BOOLEAN" | "BOOL" => no_args(args, Self::Boolean),
            "DATE" => no_args(args, Self::Date),
            "TIME" => single_number(args).map(Self::Time),
            "DATETIME" => no_args(args, Self::DateTime),
            "DATETIME2" => single_number(args).map(Self::DateTime2),
            "DATETIMEOFFSET" => single_number(args).map(Self::DateTimeOffset),
            "SMALLDATETIME" => no_args(args, Self::SmallDateTime),
            "TIMESTAMP" | "ROWVERSION" => no_args(args, Self::Timestamp),
            "CHAR" | "CHARACTER" => length(args).map(Self::Char),
            "VARCHAR" => length(args).map(Self::VarChar),
            "NCHAR" => length(args).map(Self::NChar),
            "NVARCHAR" => length(args).map(Self::NVarChar),
            "TEXT" => no_args(args, Self::Text),
            "NTEXT" => no_args(args, Self::NText),
            "BINARY" => length(args).map(Self::Binary),
            "VARBINARY" => length(args).map(Self::VarBinary),
            "IMAGE" => no_args(args, Self::Image),
            "UNIQUEIDENTIFIER" => no_args(args, Self::UniqueIdentifier),
            "XML" => no_args(args, Self::Xml),
            "SQL_VARIANT" => no_args(args, Self::SqlVariant),
            _ => None,
        }
    }
}

fn write_opt(f: &mut fmt::Formatter<'_>, name: &str, arg: Option<impl fmt::Display>) -> fmt::Result {
    match arg {
        Some(arg) => write!(f, "{name}({arg})"),
        None => f.write_str(name),
    }
}

fn write_precision(f: &mut fmt::Formatter<'_>, name: &str, precision: Option<u64>, scale: Option<u64>) -> fmt::Result {
    match (precision, scale) {
        (Some(p), Some(s)) => write!(f, "{name}({p}, {s})"),
        (Some(p), None) => write!(f, "{name}({p})"),
        _ => f.write_str(name),
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bit => f.write_str("BIT"),
            Self::TinyInt => f.write_str("TINYINT"),
            Self::SmallInt => f.write_str("SMALLINT"),
            Self::Int => f.write_str("INT"),
            Self::BigInt => f.write_str("BIGINT"),
            Self::Decimal { precision, scale } => write_precision(f, "DECIMAL", *precision, *scale),
            Self::Numeric { precision, scale } => write_precision(f, "NUMERIC", *precision, *scale),
            Self::Money => f.write_str("MONEY"),
            Self::SmallMoney => f.write_str("SMALLMONEY"),
            Self::Float(p) => write_opt(f, "FLOAT", *p),
            Self::Real => f.write_str("REAL"),
            Self::DoublePrecision => f.write_str("DOUBLE PRECISION"),
            Self::Boolean => f.write_str("BOOLEAN"),
            Self::Date => f.write_str("DATE"),
            Self::Time(p) => write_opt(f, "TIME", *p),
            Self::DateTime => f.write_str("DATETIME"),
            Self::DateTime2(p) => write_opt(f, "DATETIME2", *p),
            Self::DateTimeOffset(p) => write_opt(f, "DATETIMEOFFSET", *p),
            Self::SmallDateTime => f.write_str("SMALLDATETIME"),
            Self::Timestamp => f.write_str("TIMESTAMP"),
            Self::Char(n) => write_opt(f, "CHAR", *n),
            Self::VarChar(n) => write_opt(f, "VARCHAR", *n),
            Self::NChar(n) => write_opt(f, "NCHAR", *n),
            Self::NVarChar(n) => write_opt(f, "NVARCHAR", *n),
            Self::Text => f.write_str("TEXT"),
            Self::NText => f.write_str("NTEXT"),
            Self::Binary(n) => write_opt(f, "BINARY", *n),
            Self::VarBinary(n) => write_opt(f, "VARBINARY", *n),
            Self::Image => f.write_str("IMAGE"),
            Self::UniqueIdentifier => f.write_str("UNIQUEIDENTIFIER"),
            Self::Xml => f.write_str("XML"),
            Self::SqlVariant => f.write_str("SQL_VARIANT"),
            Self::Custom { name, args } => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "({})", super::comma_separated(args))?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Ident;
    use crate::lexer::QuoteStyle;

    fn resolve(name: &str, args: Vec<TypeArg>) -> DataType {
        DataType::resolve(ObjectName::from_parts(&[name]), args)
    }

    #[test]
    fn test_resolve_builtins() {
        assert_eq!(resolve("int", vec![]), DataType::Int);
        assert_eq!(resolve("INTEGER", vec![]), DataType::Int);
        assert_eq!(
            resolve("decimal", vec![TypeArg::Number(10), TypeArg::Number(2)]),
            DataType::Decimal {
                precision: Some(10),
                scale: Some(2)
            }
        );
        assert_eq!(
            resolve("nvarchar", vec![TypeArg::Max]),
            DataType::NVarChar(Some(CharLength::Max))
        );
        assert_eq!(resolve("datetime2", vec![TypeArg::Number(7)]), DataType::DateTime2(Some(7)));
    }

    #[test]
    fn test_resolve_falls_back_to_custom() {
        let ty = resolve("INT", vec![TypeArg::Number(5)]);
        assert!(matches!(ty, DataType::Custom { .. }));
        assert_eq!(ty.to_string(), "INT(5)");

        let quoted = DataType::resolve(ObjectName(vec![Ident::with_quote(QuoteStyle::Bracket, "int")]), vec![]);
        assert!(matches!(quoted, DataType::Custom { .. }));

        let qualified = resolve("geography", vec![]);
        assert_eq!(qualified.to_string(), "geography");
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::VarChar(Some(CharLength::Fixed(50))).to_string(), "VARCHAR(50)");
        assert_eq!(DataType::NVarChar(Some(CharLength::Max)).to_string(), "NVARCHAR(MAX)");
        assert_eq!(
            DataType::Numeric {
                precision: Some(18),
                scale: None
            }
            .to_string(),
            "NUMERIC(18)"
        );
        assert_eq!(DataType::DoublePrecision.to_string(), "DOUBLE PRECISION");
    }
}
