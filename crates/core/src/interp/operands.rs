//! Operand stack and typed operand access.

use rust_decimal::Decimal;

use crate::error::{PdfError, Result};
use crate::model::objects::{PDFDict, PDFObject, PDFStream, PDFString};
use crate::utils::Matrix;

/// Literal operands collected between two operators.
#[derive(Debug, Default)]
pub struct OperandStack {
    items: Vec<PDFObject>,
}

impl OperandStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: PDFObject) {
        self.items.push(value);
    }

    /// Take every operand in push order, leaving the stack empty.
    pub fn drain(&mut self) -> Vec<PDFObject> {
        std::mem::take(&mut self.items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The operand list handed to one operator, with typed accessors.
///
/// Accessor failures are reported as `TypeMismatch` naming the operator
/// and operand index.
#[derive(Debug, Clone, Copy)]
pub struct Operands<'a> {
    operator: &'a str,
    args: &'a [PDFObject],
}

impl<'a> Operands<'a> {
    pub const fn new(operator: &'a str, args: &'a [PDFObject]) -> Self {
        Self { operator, args }
    }

    pub const fn operator(&self) -> &'a str {
        self.operator
    }

    pub const fn len(&self) -> usize {
        self.args.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub const fn all(&self) -> &'a [PDFObject] {
        self.args
    }

    pub fn get(&self, index: usize) -> Result<&'a PDFObject> {
        self.args.get(index).ok_or_else(|| {
            PdfError::InvalidValue(format!("{}: missing operand {index}", self.operator))
        })
    }

    fn typed<T>(&self, index: usize, f: impl FnOnce(&'a PDFObject) -> Result<T>) -> Result<T> {
        f(self.get(index)?).map_err(|e| e.for_operand(self.operator, index))
    }

    pub fn number(&self, index: usize) -> Result<Decimal> {
        self.typed(index, PDFObject::as_number)
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        self.typed(index, PDFObject::as_int)
    }

    pub fn name(&self, index: usize) -> Result<&'a str> {
        self.typed(index, PDFObject::as_name)
    }

    pub fn string(&self, index: usize) -> Result<&'a PDFString> {
        self.typed(index, PDFObject::as_string)
    }

    pub fn array(&self, index: usize) -> Result<&'a [PDFObject]> {
        self.typed(index, |obj| obj.as_array().map(Vec::as_slice))
    }

    pub fn dict(&self, index: usize) -> Result<&'a PDFDict> {
        self.typed(index, PDFObject::as_dict)
    }

    pub fn stream(&self, index: usize) -> Result<&'a PDFStream> {
        self.typed(index, PDFObject::as_stream)
    }

    /// Two numbers starting at `index`.
    pub fn point(&self, index: usize) -> Result<(Decimal, Decimal)> {
        Ok((self.number(index)?, self.number(index + 1)?))
    }

    /// Six numbers starting at `index`.
    pub fn matrix(&self, index: usize) -> Result<Matrix> {
        Ok((
            self.number(index)?,
            self.number(index + 1)?,
            self.number(index + 2)?,
            self.number(index + 3)?,
            self.number(index + 4)?,
            self.number(index + 5)?,
        ))
    }

    /// Every operand as a number.
    pub fn numbers(&self) -> Result<Vec<Decimal>> {
        (0..self.args.len()).map(|i| self.number(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_drain_clears_stack() {
        let mut stack = OperandStack::new();
        stack.push(PDFObject::from(1i64));
        stack.push(PDFObject::name("F1"));
        let drained = stack.drain();
        assert_eq!(drained.len(), 2);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_type_mismatch_names_operand() {
        let args = vec![PDFObject::name("oops")];
        let ops = Operands::new("Ts", &args);
        assert_eq!(
            ops.number(0),
            Err(PdfError::TypeMismatch {
                operator: "Ts".into(),
                index: 0,
                expected: "number",
                got: "name",
            })
        );
    }

    #[test]
    fn test_matrix() {
        let args: Vec<PDFObject> = [1, 0, 0, 1, 10, 20].map(|n| PDFObject::from(n as i64)).to_vec();
        let ops = Operands::new("cm", &args);
        assert_eq!(
            ops.matrix(0).unwrap(),
            (dec!(1), dec!(0), dec!(0), dec!(1), dec!(10), dec!(20))
        );
    }
}
