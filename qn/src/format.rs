use std::fmt::Write;

use crate::{Cell, Context, Heap, Obj};

const MAX_DEPTH: usize = 8;
const MAX_ITEMS: usize = 64;

impl Heap {
    /// Renders `object` for diagnostics.
    ///
    /// Nesting and list length are bounded, so cyclic structures render
    /// in finite space.
    pub fn render(&self, object: Obj) -> String {
        let mut output = String::new();
        self.render_internal(object, 0, &mut output);
        output
    }

    fn render_internal(&self, object: Obj, depth: usize, output: &mut String) {
        let Some(&cell) = self.get(object) else {
            output.push_str("nil");
            return;
        };

        match cell {
            Cell::Pair { .. } => {
                if depth >= MAX_DEPTH {
                    output.push_str("(...)");
                    return;
                }
                output.push('(');
                let mut current = object;
                let mut items = 0;
                while let Some((first, rest)) = self.pair(current) {
                    if items > 0 {
                        output.push(' ');
                    }
                    if items == MAX_ITEMS {
                        output.push_str("...");
                        current = Obj::NIL;
                        break;
                    }
                    self.render_internal(first, depth + 1, output);
                    items += 1;
                    current = rest;
                }
                if !current.is_nil() {
                    output.push_str(" . ");
                    self.render_internal(current, depth + 1, output);
                }
                output.push(')');
            }
            Cell::Number(value) => output.push_str(&format_number(value)),
            Cell::String { .. } => {
                let bytes: Vec<u8> = self.string_bytes(object).collect();
                let _ = write!(output, "\"{}\"", String::from_utf8_lossy(&bytes));
            }
            Cell::Symbol { .. } => {
                let name = self.symbol_name(object).unwrap_or(Obj::NIL);
                let bytes: Vec<u8> = self.string_bytes(name).collect();
                output.push_str(&String::from_utf8_lossy(&bytes));
            }
            Cell::ForeignPointer(ptr) | Cell::Object { data: ptr, .. } => {
                let _ = write!(output, "[{} {:#x}]", cell.kind(), ptr.addr());
            }
            other => {
                let _ = write!(output, "[{}]", other.kind());
            }
        }
    }
}

/// Formats like C's `%.7g`.
pub fn format_number(value: f32) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let value = f64::from(value);
    let scientific = format!("{:.6e}", value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..7).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (6 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}

impl Context {
    pub fn render(&self, object: Obj) -> String {
        self.heap.render(object)
    }

    /// Emits the rendering of `object` through the host's `write` hook.
    pub fn write(&mut self, object: Obj) {
        let rendered = self.heap.render(object);
        rendered.bytes().for_each(|byte| self.host.write(byte));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextCreateInfo, ForeignPtr, Host};

    fn context() -> Context {
        Context::new(ContextCreateInfo::default()).unwrap()
    }

    #[test]
    fn numbers_format_like_percent_g() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(1234567.0), "1234567");
        assert_eq!(format_number(12345678.0), "1.234568e+07");
        assert_eq!(format_number(0.0001), "0.0001");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(f32::INFINITY), "inf");
        assert_eq!(format_number(f32::NAN), "nan");
    }

    #[test]
    fn renders_lists_and_atoms() {
        let mut ctx = context();
        let one = ctx.number(1.0).unwrap();
        let two = ctx.number(2.0).unwrap();
        let name = ctx.string("hi").unwrap();
        let sym = ctx.symbol("sym").unwrap();
        let list = ctx.list(&[one, two, name, sym]).unwrap();

        assert_eq!(ctx.render(list), "(1 2 \"hi\" sym)");
        assert_eq!(ctx.render(Obj::NIL), "nil");
    }

    #[test]
    fn renders_dotted_tail() {
        let mut ctx = context();
        let one = ctx.number(1.0).unwrap();
        let two = ctx.number(2.0).unwrap();
        let pair = ctx.cons(one, two).unwrap();
        assert_eq!(ctx.render(pair), "(1 . 2)");
    }

    #[test]
    fn renders_opaque_kinds_by_name() {
        let mut ctx = context();
        let ptr = ctx.foreign_pointer(ForeignPtr::from_addr(0xff)).unwrap();
        let prim = ctx.primitive(3).unwrap();
        assert_eq!(ctx.render(ptr), "[foreign-pointer 0xff]");
        assert_eq!(ctx.render(prim), "[primitive]");
    }

    #[test]
    fn cyclic_list_renders_bounded() {
        let mut ctx = context();
        let one = ctx.number(1.0).unwrap();
        let cycle = ctx.cons(one, Obj::NIL).unwrap();
        ctx.set_cdr(cycle, cycle).unwrap();

        let rendered = ctx.render(cycle);
        assert!(rendered.ends_with("...)"));
        assert!(rendered.len() < 1024);
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Host for SharedBuffer {
        fn write(&mut self, byte: u8) {
            self.0.lock().push(byte);
        }
    }

    #[test]
    fn write_goes_through_the_host() {
        let buffer = SharedBuffer::default();
        let mut ctx = Context::with_host(ContextCreateInfo::default(), buffer.clone()).unwrap();
        let sym = ctx.symbol("hello").unwrap();
        ctx.write(sym);
        ctx.write_byte(b'\n');

        assert_eq!(*buffer.0.lock(), b"hello\n");
    }
}
