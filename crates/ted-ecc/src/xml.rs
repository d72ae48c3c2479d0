// Small helpers over roxmltree: every document the ECC serves is a flat
// tree of uniquely-named leaf elements, so "first descendant with this
// tag" lookup is all the navigation the crate needs.

use std::str::FromStr;

use roxmltree::Node;

use crate::error::Error;

/// First descendant element named `name`, or a `MissingElement` error.
pub(crate) fn child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> Result<Node<'a, 'input>, Error> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .ok_or(Error::MissingElement { element: name })
}

/// Text of the first descendant element named `name`.
///
/// An empty element (`<Description></Description>`) yields an empty string;
/// a missing element is an error.
pub(crate) fn child_text(node: Node<'_, '_>, name: &'static str) -> Result<String, Error> {
    Ok(child(node, name)?.text().unwrap_or_default().to_owned())
}

/// Parse the text of the first descendant element named `name`.
pub(crate) fn child_parse<T: FromStr>(node: Node<'_, '_>, name: &'static str) -> Result<T, Error> {
    let text = child_text(node, name)?;
    text.trim().parse().map_err(|_| Error::InvalidField {
        element: name,
        value: text,
    })
}
