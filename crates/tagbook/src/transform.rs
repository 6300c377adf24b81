//! Header-as-value rewrite for an explicit list of scalar tables.

use tagbook_io_xlsx::SpecDataBlock;

use crate::spec::{SpecScalarTableRef, SpecTableDescriptor, TagbookError};

/// Whether `descriptor` is one of the listed scalar tables.
pub fn is_scalar_table(descriptor: &SpecTableDescriptor, l_refs: &[SpecScalarTableRef]) -> bool {
    l_refs.iter().any(|r| {
        r.document_name == descriptor.document_name && r.table_name == descriptor.table_name
    })
}

/// Lift the single cell of a one-row block into the sole column name of a row-less block.
///
/// Returns the new block and, for blocks wider than one column, a warning
/// (only the first cell is lifted).
pub fn apply_scalar_transform(
    block: &SpecDataBlock,
    descriptor: &SpecTableDescriptor,
) -> Result<(SpecDataBlock, Option<String>), TagbookError> {
    match block.height() {
        0 => {
            return Err(TagbookError::resolution(
                descriptor,
                "scalar table has no row to lift",
            ));
        }
        1 => {}
        n => {
            return Err(TagbookError::resolution(
                descriptor,
                format!("scalar table must have exactly one row, found {n}"),
            ));
        }
    }

    let Some(value) = block.rows()[0].first() else {
        return Err(TagbookError::resolution(
            descriptor,
            "scalar table has no column to lift",
        ));
    };
    if value.is_none() {
        return Err(TagbookError::resolution(
            descriptor,
            "scalar table value is empty",
        ));
    }

    let warning = (block.width() > 1).then(|| {
        format!(
            "{}.{}: scalar table has {} columns; only the first value is used",
            descriptor.document_name,
            descriptor.table_name,
            block.width()
        )
    });

    Ok((SpecDataBlock::header_only(vec![value.to_string()]), warning))
}
