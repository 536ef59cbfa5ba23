use std::collections::HashSet;
use std::sync::Arc;

/// String-interning capability supplied by the host.
///
/// Every adapted event carries several repeated labels; the host decides how they are stored and
/// what handle type events refer to them by.
pub trait StringPool {
    type Handle: Clone;

    fn intern(&mut self, s: &str) -> Self::Handle;
}

/// Interner backed by a set of shared strings. Equal inputs yield handles to the same allocation.
#[derive(Debug, Default)]
pub struct SharedStringPool {
    strings: HashSet<Arc<str>>,
}

impl SharedStringPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl StringPool for SharedStringPool {
    type Handle = Arc<str>;

    fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.get(s) {
            return Arc::clone(existing);
        }
        let interned: Arc<str> = Arc::from(s);
        self.strings.insert(Arc::clone(&interned));
        interned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_strings_share_storage() {
        let mut pool = SharedStringPool::new();
        let a = pool.intern("nvcontext");
        let b = pool.intern("nvcontext");
        let c = pool.intern("(event_comm)");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.len(), 2);
    }
}
