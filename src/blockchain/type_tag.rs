//! Move type tags: parsing from their textual form and BCS wire layout.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::blockchain::types::AccountAddress;

/// Type-tag parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type tag `{input}`: {reason}")]
pub struct TypeTagError {
    pub input: String,
    pub reason: String,
}

/// A concrete on-chain type.
///
/// Variant order is the BCS discriminant and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TypeTag {
    Bool,
    U8,
    U64,
    U128,
    Address,
    Signer,
    Vector(Box<TypeTag>),
    Struct(Box<StructTag>),
    U16,
    U32,
    U256,
}

/// Fully qualified struct type, e.g. `0x1::aptos_coin::AptosCoin`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StructTag {
    pub address: AccountAddress,
    pub module: String,
    pub name: String,
    pub type_args: Vec<TypeTag>,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Bool => f.write_str("bool"),
            TypeTag::U8 => f.write_str("u8"),
            TypeTag::U16 => f.write_str("u16"),
            TypeTag::U32 => f.write_str("u32"),
            TypeTag::U64 => f.write_str("u64"),
            TypeTag::U128 => f.write_str("u128"),
            TypeTag::U256 => f.write_str("u256"),
            TypeTag::Address => f.write_str("address"),
            TypeTag::Signer => f.write_str("signer"),
            TypeTag::Vector(inner) => write!(f, "vector<{}>", inner),
            TypeTag::Struct(tag) => write!(f, "{}", tag),
        }
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.address, self.module, self.name)?;
        if !self.type_args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.type_args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl FromStr for TypeTag {
    type Err = TypeTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser { input: s, pos: 0 };
        let tag = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(tag)
    }
}

/// Recursive-descent parser over the textual form.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: &str) -> TypeTagError {
        TypeTagError {
            input: self.input.to_string(),
            reason: format!("{} at offset {}", reason, self.pos),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), TypeTagError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{}`", c)))
        }
    }

    /// Reads a run of identifier characters and `::` separators.
    fn path(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == ':'))
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    fn parse_type(&mut self) -> Result<TypeTag, TypeTagError> {
        let path = self.path();
        let tag = match path {
            "" => return Err(self.error("expected a type")),
            "bool" => TypeTag::Bool,
            "u8" => TypeTag::U8,
            "u16" => TypeTag::U16,
            "u32" => TypeTag::U32,
            "u64" => TypeTag::U64,
            "u128" => TypeTag::U128,
            "u256" => TypeTag::U256,
            "address" => TypeTag::Address,
            "signer" => TypeTag::Signer,
            "vector" => {
                self.expect('<')?;
                let inner = self.parse_type()?;
                self.expect('>')?;
                TypeTag::Vector(Box::new(inner))
            }
            _ => TypeTag::Struct(Box::new(self.parse_struct(path)?)),
        };
        Ok(tag)
    }

    fn parse_struct(&mut self, path: &str) -> Result<StructTag, TypeTagError> {
        let parts: Vec<&str> = path.split("::").collect();
        let [address, module, name] = parts.as_slice() else {
            return Err(self.error("expected `address::module::name`"));
        };
        let address = address.parse().map_err(|_| self.error("invalid address"))?;
        for ident in [module, name] {
            if !is_identifier(ident) {
                return Err(self.error(&format!("invalid identifier `{}`", ident)));
            }
        }

        let mut type_args = Vec::new();
        if self.eat('<') {
            loop {
                type_args.push(self.parse_type()?);
                if self.eat(',') {
                    continue;
                }
                self.expect('>')?;
                break;
            }
        }

        Ok(StructTag {
            address,
            module: module.to_string(),
            name: name.to_string(),
            type_args,
        })
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
