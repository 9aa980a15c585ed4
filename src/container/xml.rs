//! Minimal element walker shared by the block map and bundle manifest passes.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

/// Walk every element of a well-formed document in order.
///
/// `visit` receives the local names of the element's ancestors (the root
/// element first) and the element itself.
pub(crate) fn walk_elements<F>(xml: &[u8], document: &'static str, mut visit: F) -> Result<()>
where
    F: FnMut(&[Vec<u8>], &BytesStart<'_>) -> Result<()>,
{
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut ancestors: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf).map_err(|err| {
            Error::xml(document, format!("at byte {}: {err}", reader.buffer_position()))
        })? {
            Event::Start(e) => {
                enter_root(&ancestors, &mut seen_root, document)?;
                visit(&ancestors, &e)?;
                ancestors.push(e.local_name().as_ref().to_vec());
            }
            Event::Empty(e) => {
                enter_root(&ancestors, &mut seen_root, document)?;
                visit(&ancestors, &e)?;
            }
            Event::End(_) => {
                if ancestors.pop().is_none() {
                    return Err(Error::xml(document, "unexpected closing tag"));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !ancestors.is_empty() {
        return Err(Error::xml(document, "unexpected end of document"));
    }
    if !seen_root {
        return Err(Error::xml(document, "no root element"));
    }
    Ok(())
}

fn enter_root(ancestors: &[Vec<u8>], seen_root: &mut bool, document: &'static str) -> Result<()> {
    if ancestors.is_empty() {
        if *seen_root {
            return Err(Error::xml(document, "more than one root element"));
        }
        *seen_root = true;
    }
    Ok(())
}

/// Value of attribute `name`, or `None` when it is missing or empty.
pub(crate) fn non_empty_attribute(
    element: &BytesStart<'_>,
    name: &str,
    document: &'static str,
) -> Result<Option<String>> {
    let Some(attr) = element
        .try_get_attribute(name)
        .map_err(|err| Error::xml(document, err))?
    else {
        return Ok(None);
    };
    let value = attr
        .unescape_value()
        .map_err(|err| Error::xml(document, err))?;
    Ok((!value.is_empty()).then(|| value.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depths(xml: &str) -> Result<Vec<(usize, String)>> {
        let mut out = Vec::new();
        walk_elements(xml.as_bytes(), "test", |ancestors, e| {
            let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
            out.push((ancestors.len(), name));
            Ok(())
        })?;
        Ok(out)
    }

    #[test]
    fn reports_depth_of_each_element() {
        let found = depths("<?xml version=\"1.0\"?><a><b/><c><d/></c></a>").unwrap();
        assert_eq!(
            found,
            vec![
                (0, "a".to_string()),
                (1, "b".to_string()),
                (1, "c".to_string()),
                (2, "d".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_documents() {
        assert!(depths("<a><b></a>").is_err());
        assert!(depths("<a><b>").is_err());
        assert!(depths("").is_err());
        assert!(depths("<a/><b/>").is_err());
        assert!(depths("not xml at all").is_err());
    }

    #[test]
    fn empty_attribute_reads_as_missing() {
        let mut values = Vec::new();
        walk_elements(b"<r><e A=\"\" B=\"x&amp;y\"/></r>", "test", |ancestors, e| {
            if ancestors.len() == 1 {
                values.push(non_empty_attribute(e, "A", "test")?);
                values.push(non_empty_attribute(e, "B", "test")?);
                values.push(non_empty_attribute(e, "C", "test")?);
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(values, vec![None, Some("x&y".to_string()), None]);
    }
}
