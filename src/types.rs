use crate::error::{DbError, DbResult};
use crate::fields::{FieldVal, IntField, StringField};

/// Maximum number of bytes a string field's payload may occupy, not
/// counting the 4-byte length prefix.
pub const STRING_SIZE: usize = 256;

// Only support Int and String types
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Type {
    IntType,
    StringType,
}

impl Type {
    // Get the size of the type in bytes
    pub fn get_len(&self) -> usize {
        match self {
            // 4 bytes ints
            Type::IntType => 4,
            // 4 bytes for length + STRING_SIZE bytes for string
            Type::StringType => STRING_SIZE + 4,
        }
    }

    // Parse bytes into a FieldVal
    pub fn parse(&self, bytes: &[u8]) -> DbResult<FieldVal> {
        match self {
            Type::IntType => {
                if bytes.len() < 4 {
                    return Err(DbError::SchemaMismatch);
                }
                let mut int_bytes = [0; 4];
                int_bytes.copy_from_slice(&bytes[..4]);
                Ok(FieldVal::IntField(IntField::new(i32::from_be_bytes(
                    int_bytes,
                ))))
            }
            Type::StringType => {
                if bytes.len() < 4 {
                    return Err(DbError::SchemaMismatch);
                }
                let mut len_bytes = [0; 4];
                len_bytes.copy_from_slice(&bytes[..4]);
                let len = u32::from_be_bytes(len_bytes);
                if (len as usize) > STRING_SIZE || bytes.len() < 4 + len as usize {
                    return Err(DbError::SchemaMismatch);
                }
                let string_bytes = bytes[4..4 + len as usize].to_vec();
                let value =
                    String::from_utf8(string_bytes).map_err(|_| DbError::SchemaMismatch)?;
                Ok(FieldVal::StringField(StringField::new(value, len)))
            }
        }
    }
}
