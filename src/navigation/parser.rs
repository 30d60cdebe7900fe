// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Streaming decoder for the `Navigation` document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{NavigationTree, NodeId};
use crate::error::NavigationError;

const ROOT_TAG: &[u8] = b"Navigation";
const ITEM_TAG: &[u8] = b"item";
const NAME_TAG: &[u8] = b"name";

/// Element currently open in the document.
#[derive(Debug, Clone, Copy)]
enum Open {
    Root,
    Item(NodeId),
    Name(NodeId),
    Other,
}

pub(super) fn parse(raw: &str) -> Result<NavigationTree, NavigationError> {
    let mut reader = Reader::from_str(raw);
    let mut tree = NavigationTree::default();
    let mut stack: Vec<Open> = Vec::new();
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(markup)?;
        match event {
            Event::Start(element) => {
                let open = open_element(&mut tree, &stack, &element, &mut seen_root)?;
                stack.push(open);
            }
            Event::Empty(element) => {
                // A self-closing element opens and closes at once; only items matter.
                open_element(&mut tree, &stack, &element, &mut seen_root)?;
            }
            Event::Text(text) => {
                if let Some(Open::Name(node)) = stack.last() {
                    let text = text.unescape().map_err(markup)?;
                    tree.append_name(*node, &text);
                }
            }
            Event::End(_) => {
                if stack.pop().is_none() {
                    return Err(NavigationError::Markup(
                        "closing tag without opening tag".to_string(),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(NavigationError::Markup(format!(
            "{} element(s) left unclosed",
            stack.len()
        )));
    }
    if !seen_root {
        return Err(NavigationError::MissingRoot);
    }

    Ok(tree)
}

fn open_element(
    tree: &mut NavigationTree,
    stack: &[Open],
    element: &BytesStart<'_>,
    seen_root: &mut bool,
) -> Result<Open, NavigationError> {
    let name = element.name();
    let tag = name.as_ref();

    let Some(parent) = stack.last() else {
        if tag != ROOT_TAG || *seen_root {
            return Err(NavigationError::UnexpectedRoot(
                String::from_utf8_lossy(tag).into_owned(),
            ));
        }
        *seen_root = true;
        tree.id = attribute(element, "id")?;
        return Ok(Open::Root);
    };

    let open = match (*parent, tag) {
        (Open::Root, ITEM_TAG) => {
            let id = attribute(element, "id")?.ok_or(NavigationError::MissingId)?;
            Open::Item(tree.push_node(None, id))
        }
        (Open::Item(parent), ITEM_TAG) => {
            let id = attribute(element, "id")?.ok_or(NavigationError::MissingId)?;
            Open::Item(tree.push_node(Some(parent), id))
        }
        (Open::Item(node), NAME_TAG) => Open::Name(node),
        _ => Open::Other,
    };

    Ok(open)
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Result<Option<String>, NavigationError> {
    let Some(attribute) = element.try_get_attribute(key).map_err(markup)? else {
        return Ok(None);
    };
    let value = attribute.unescape_value().map_err(markup)?;
    Ok(Some(value.into_owned()))
}

fn markup(err: impl std::fmt::Display) -> NavigationError {
    NavigationError::Markup(err.to_string())
}
