//! Flattening resolved bindings into one composite program, and mapping
//! composite positions back to where the author wrote them.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::ast::Node;
use crate::binding::Binding;
use crate::builtins::CONTEXT_WORD;
use crate::dependency::Resolution;
use crate::diagnostic::Problem;
use crate::edit::{EditBuffer, SourceMap};
use crate::error::CoreError;
use crate::lexer::is_quote;
use crate::span::{Span, utf16_len, line_col, offset_at};

/// One rewritten binding inside the composite text.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub name: String,
    pub binding: Arc<Binding>,
    pub import_index: Option<usize>,
    pub original: String,
    pub generated: String,
    pub map: SourceMap,
    /// Offset of `generated` in the composite text.
    pub offset: usize,
}

impl Fragment {
    /// Composite span of the fragment including its trailing separator.
    pub fn span(&self) -> Span {
        Span::new(self.offset, self.offset + utf16_len(&self.generated))
    }

    /// Map a composite offset inside this fragment to an offset in the
    /// binding's original content.
    fn original_offset(&self, composite: usize) -> usize {
        let local = composite.saturating_sub(self.offset);
        let (line, column) = line_col(&self.generated, local);
        let (line, column) = self.map.lookup(line, column).unwrap_or((line, column));
        offset_at(&self.original, line, column)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Flattened {
    pub text: String,
    pub fragments: Vec<Fragment>,
}

/// Rewrite every resolved binding into canonical text and join them in
/// resolution order, one per line.
pub fn flatten(resolution: &Resolution<'_>) -> Result<Flattened, CoreError> {
    let mut flattened = Flattened::default();
    let mut offset = 0;

    for node in &resolution.nodes {
        let binding = &node.binding;
        let parsed = binding.exp().ok_or_else(|| CoreError::Fault {
            position: binding.content_position.start,
            message: format!("binding {} was flattened before it was parsed", node.name),
        })?;

        let mut buffer = EditBuffer::new(&binding.content);
        let quotes = Quotes {
            names: &parsed.dependencies,
            indices: &node.dependencies,
        };
        for source in &parsed.ast {
            for line in &source.lines {
                for item in &line.nodes {
                    rewrite(item, &quotes, &mut buffer)?;
                }
            }
        }
        let (generated, map) = buffer.apply()?;
        trace!(binding = %node.name, offset, generated = %generated, "rewrote fragment");

        if !flattened.text.is_empty() {
            flattened.text.push('\n');
            offset += 1;
        }
        flattened.text.push_str(&generated);
        let length = utf16_len(&generated);
        flattened.fragments.push(Fragment {
            name: node.name.clone(),
            binding: Arc::clone(binding),
            import_index: node.import_index,
            original: binding.content.clone(),
            generated,
            map,
            offset,
        });
        offset += length;
    }

    debug!(
        fragments = flattened.fragments.len(),
        length = offset,
        "flattened bindings"
    );
    Ok(flattened)
}

/// Quoted names of one binding and the resolution index each maps to.
struct Quotes<'q> {
    names: &'q [String],
    indices: &'q [usize],
}

impl Quotes<'_> {
    fn index_of(&self, name: &str) -> Option<usize> {
        let at = self.names.iter().position(|quoted| quoted == name)?;
        self.indices.get(at).copied()
    }
}

fn rewrite(node: &Node, quotes: &Quotes<'_>, buffer: &mut EditBuffer) -> Result<(), CoreError> {
    let opcode = match node {
        Node::Value(value) => {
            if value.id.is_some() {
                buffer.replace(value.position, value.value.as_str());
            }
            return Ok(());
        }
        Node::Alias(_) => return Ok(()),
        Node::Opcode(opcode) => opcode,
    };

    let name = &opcode.opcode;
    if let Some(context) = opcode.context {
        buffer.replace(name.position, CONTEXT_WORD);
        match (&opcode.operand_args, context.row) {
            (Some(args), _) => buffer.insert(args.position.start + 1, format!("{} ", context.column)),
            (None, Some(row)) => {
                buffer.insert(name.position.end + 1, format!("<{} {}>", context.column, row))
            }
            (None, None) => {}
        }
    } else if name.name.contains('.') {
        let word = match &opcode.word {
            Some(word) => word.clone(),
            None => name.name.rsplit('.').next().unwrap_or_default().to_string(),
        };
        buffer.replace(name.position, word);
    }

    if let Some(args) = &opcode.operand_args {
        for arg in args.args.iter().filter(|arg| is_quote(&arg.value)) {
            let quoted = &arg.value[1..];
            let index = quotes.index_of(quoted).ok_or_else(|| CoreError::Fault {
                position: arg.position.start,
                message: format!("quote {quoted} has no resolved dependency"),
            })?;
            buffer.replace(arg.position, index.to_string());
        }
    }

    for parameter in &opcode.parameters {
        rewrite(parameter, quotes, buffer)?;
    }
    Ok(())
}

/// Map a problem reported on the composite text back to the document.
///
/// Problems in imported bindings land on the import's hash position;
/// problems outside every fragment are returned unchanged.
pub fn backmap(problem: &Problem, fragments: &[Fragment], import_positions: &[Span]) -> Problem {
    let start = problem.position.start;
    let Some(fragment) = fragments
        .iter()
        .find(|fragment| fragment.span().contains(start))
    else {
        return problem.clone();
    };

    if let Some(index) = fragment.import_index {
        let position = import_positions
            .get(index)
            .copied()
            .unwrap_or(fragment.binding.position);
        return problem.relocated(position);
    }

    let fragment_end = fragment.span().end;
    let base = fragment.binding.content_position.start;
    let original_start = fragment.original_offset(start);
    // the char after the end maps exactly even when the end sits inside a rewrite
    let after_end = fragment.original_offset(problem.position.end.min(fragment_end) + 1);
    let original_end = after_end.saturating_sub(1).max(original_start);
    problem.relocated(Span::new(base + original_start, base + original_end))
}
