use std::str::FromStr;

#[derive(Debug)]
pub struct InvalidIdError {
    message: &'static str,
}

impl InvalidIdError {
    fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for InvalidIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid ID: {}", self.message)
    }
}

impl std::error::Error for InvalidIdError {}

macro_rules! impl_id {
    ($t:ident, $n:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $t(i64);

        #[allow(dead_code)]
        impl $t {
            pub(crate) fn from_db(id: i64) -> Self {
                Self(id)
            }

            pub(crate) fn to_db(self) -> i64 {
                self.0
            }
        }

        impl From<$t> for i64 {
            fn from(id: $t) -> Self {
                id.0
            }
        }

        impl FromStr for $t {
            type Err = InvalidIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let id = s
                    .parse::<i64>()
                    .map_err(|_| InvalidIdError::new(std::concat!("not an ", $n, " ID")))?;
                if id < 0 {
                    return Err(InvalidIdError::new(std::concat!("not an ", $n, " ID")));
                }
                Ok(Self(id))
            }
        }

        impl std::fmt::Display for $t {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl sqlx::Type<sqlx::Sqlite> for $t {
            fn type_info() -> <sqlx::Sqlite as sqlx::Database>::TypeInfo {
                <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
            }
        }

        impl<'a> sqlx::Encode<'a, sqlx::Sqlite> for $t {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Sqlite as sqlx::database::HasArguments<'a>>::ArgumentBuffer,
            ) -> sqlx::encode::IsNull {
                let db_id = self.to_db();
                <i64 as sqlx::Encode<'a, sqlx::Sqlite>>::encode_by_ref(&db_id, buf)
            }
        }

        impl<'r, DB> sqlx::Decode<'r, DB> for $t
        where
            DB: sqlx::Database,
            i64: sqlx::Decode<'r, DB>,
        {
            fn decode(
                value: <DB as sqlx::database::HasValueRef<'r>>::ValueRef,
            ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
                let id = <i64 as sqlx::Decode<'r, DB>>::decode(value)?;
                Ok(Self::from_db(id))
            }
        }
    };
}

impl_id!(ChannelId, "channel");
impl_id!(EpisodeId, "episode");
