#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use treelox::lox::{Lox, RunStatus};

/// In-memory writer whose contents stay readable after it is handed to a
/// session.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session plus handles on its program output and diagnostics.
pub fn session() -> (Lox, SharedBuffer, SharedBuffer) {
    let out = SharedBuffer::default();
    let err = SharedBuffer::default();
    let lox = Lox::with_writers(Box::new(out.clone()), Box::new(err.clone()));

    (lox, out, err)
}

/// Runs `source` in a fresh session.
pub fn run(source: &str) -> (RunStatus, String, String) {
    let (mut lox, out, err) = session();
    let status = lox.run(source);

    (status, out.contents(), err.contents())
}
