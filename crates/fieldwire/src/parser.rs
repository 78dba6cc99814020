//! Schema-less stream parser
//!
//! Walks a stream using nothing but field headers: read a header, descend
//! into it if it opens a scope, then continue at `data_start + data_size`
//! whether or not the payload was interpreted. The only codec-specific step
//! is reading a single header, so the same loop serves both formats.
//!
//! Where the codec writes END_MARKERs, each scope must end with exactly one,
//! carrying the scope's name and ending where the scope ends.

use crate::codec::IoSerialiser;
use crate::data_type::DataType;
use crate::error::{Result, WireError};
use crate::field::{FieldId, FieldTree};
use fieldwire_buffer::IoBuffer;
use tracing::debug;

/// Decode the stream header and the full field tree below the root
pub fn parse_stream<S: IoSerialiser>(ser: &mut S) -> Result<FieldTree> {
    let info = ser.get_header_info()?;
    let root = ser.get_root_header()?;
    let end = root.data_end();
    let mut tree = FieldTree::new(root);
    let root = tree.root();
    parse_children(ser, &mut tree, root, 1)?;
    ser.buffer_mut().set_position(end)?;
    debug!(protocol = %info, fields = tree.len(), "parsed stream");
    Ok(tree)
}

fn parse_children<S: IoSerialiser>(ser: &mut S, tree: &mut FieldTree, parent: FieldId, depth: usize) -> Result<()> {
    let max_depth = ser.config().max_depth;
    if depth > max_depth {
        let position = ser.buffer().position();
        return Err(WireError::structural(position, format!("nesting deeper than {}", max_depth)));
    }

    let end = tree.header(parent).data_end();
    let mut closed = false;
    while ser.buffer().position() < end {
        let header = ser.get_field_header()?;
        let next = header.data_end();
        if next > end {
            return Err(WireError::structural(
                header.header_start,
                format!("'{}' overruns its enclosing scope", header.name),
            ));
        }
        match header.data_type {
            // closes the parent; not a child of its own
            DataType::EndMarker => {
                let scope = tree.header(parent);
                if header.name != scope.name || next != end {
                    return Err(WireError::structural(
                        header.header_start,
                        format!("stray end marker '{}' inside '{}'", header.name, scope.name),
                    ));
                }
                closed = true;
            }
            DataType::StartMarker => {
                let id = tree.add_child(parent, header);
                parse_children(ser, tree, id, depth + 1)?;
            }
            _ => {
                tree.add_child(parent, header);
            }
        }
        ser.buffer_mut().set_position(next)?;
    }
    if S::END_MARKERS && !closed {
        let scope = tree.header(parent);
        return Err(WireError::structural(scope.data_end(), format!("'{}' ends without an end marker", scope.name)));
    }
    Ok(())
}
