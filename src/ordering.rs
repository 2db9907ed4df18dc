//! Sort-order helpers for list column headers.
//!
//! An order key is a field name, prefixed with `-` for descending order.

use crate::dom::Document;

pub const ORDERBY_CLASS: &str = "orderby";
pub const ORDERBY_DESC_CLASS: &str = "orderby-desc";

/// Order key after clicking column `new_order` while sorted by `old_order`.
///
/// Clicking the current column flips its direction; any other column starts
/// ascending.
pub fn get_order_by(old_order: &str, new_order: &str) -> String {
    let (old_key, old_desc) = match old_order.strip_prefix('-') {
        Some(key) => (key, true),
        None => (old_order, false),
    };
    let desc = new_order == old_key && !old_desc;
    if desc {
        format!("-{}", new_order)
    } else {
        new_order.to_string()
    }
}

/// Clear the sort indicator from every element in `list`, then mark `elem`
/// according to the direction of `order_key`.
pub fn set_order_by_classes<D: Document>(
    doc: &D,
    elem: &D::Element,
    list: &[D::Element],
    order_key: &str,
) {
    for el in list {
        doc.remove_class(el, ORDERBY_CLASS);
        doc.remove_class(el, ORDERBY_DESC_CLASS);
    }
    let class = if order_key.starts_with('-') {
        ORDERBY_DESC_CLASS
    } else {
        ORDERBY_CLASS
    };
    doc.add_class(elem, class);
}
