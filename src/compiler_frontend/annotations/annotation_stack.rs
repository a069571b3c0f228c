use crate::compiler_frontend::ast::node_ref::NodeRef;
use crate::compiler_frontend::compiler_errors::CompilerError;
use crate::projects::settings::ANNOTATION_BUFFER_CAPACITY;

/// One parsed decorator waiting to be applied to the next expression.
#[derive(Debug, Clone)]
pub struct AnnotationEntry {
    pub decorator: NodeRef,

    // Never fold into the decorator's own call, even if the decorator is a call expression
    pub force_plain_call: bool,
}

impl AnnotationEntry {
    pub fn new(decorator: NodeRef) -> Self {
        Self {
            decorator,
            force_plain_call: false,
        }
    }

    pub fn plain(decorator: NodeRef) -> Self {
        Self {
            decorator,
            force_plain_call: true,
        }
    }
}

/// Keeps the backing buffer of finished annotation lists around for the next list.
///
/// Owned by the compilation context rather than being global,
/// so concurrent compilations never share it.
#[derive(Debug, Default)]
pub struct AnnotationPool {
    spare: Vec<AnnotationEntry>,
}

impl AnnotationPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spare_capacity(&self) -> usize {
        self.spare.capacity()
    }

    fn take_buffer(&mut self) -> Vec<AnnotationEntry> {
        std::mem::take(&mut self.spare)
    }

    // Keeps whichever buffer is larger
    fn recycle(&mut self, mut buffer: Vec<AnnotationEntry>) {
        buffer.clear();
        if buffer.capacity() > self.spare.capacity() {
            self.spare = buffer;
        }
    }
}

/// Pending annotations of the declaration being parsed.
/// Last in, first out: the most recently parsed decorator is the closest to the expression
/// and is applied first.
#[derive(Debug, Default)]
pub struct AnnotationList {
    entries: Vec<AnnotationEntry>,
}

impl AnnotationList {
    /// Starts a new empty list, reusing the pool's buffer if it has one
    pub fn new(pool: &mut AnnotationPool) -> Self {
        let mut entries = pool.take_buffer();
        entries.clear();
        Self { entries }
    }

    pub fn push(&mut self, entry: AnnotationEntry) -> Result<(), CompilerError> {
        let additional = if self.entries.capacity() == 0 {
            ANNOTATION_BUFFER_CAPACITY
        } else {
            1
        };

        if let Err(e) = self.entries.try_reserve(additional) {
            return Err(CompilerError::allocation(e, entry.decorator.location));
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<AnnotationEntry> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The earliest parsed entry that is still pending
    pub fn oldest(&self) -> Option<&AnnotationEntry> {
        self.entries.first()
    }

    /// Drops any remaining entries and hands the buffer back to the pool
    pub fn release(self, pool: &mut AnnotationPool) {
        pool.recycle(self.entries);
    }
}
