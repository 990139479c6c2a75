//! Page lookup with deterministic fallback.

use std::borrow::Cow;

use crate::book::{PageNumber, PicturePage};
use crate::character::Character;
use crate::error::DataDefect;

/// Looks up `owner`'s result for the pair (`own_page`, `opponent_page`).
///
/// Never fails. Any gap in the book is recorded in `defects` and answered
/// with the fallback picture page (page 1, else the lowest page, else a blank
/// page), so both peers of a networked battle substitute the same outcome.
pub(super) fn result_page<'a>(
    owner: &'a Character,
    own_page: PageNumber,
    opponent_page: PageNumber,
    defects: &mut Vec<DataDefect>,
) -> Cow<'a, PicturePage> {
    let Some(lookup) = owner.book.lookup(own_page) else {
        defects.push(DataDefect::MissingLookupPage {
            character: owner.id.clone(),
            page: own_page,
        });
        return fallback(owner, defects);
    };

    let Some(result) = lookup.result_for(opponent_page) else {
        defects.push(DataDefect::MissingMapping {
            character: owner.id.clone(),
            lookup_page: own_page,
            opponent_page,
        });
        return fallback(owner, defects);
    };

    match owner.book.picture(result) {
        Some(page) => Cow::Borrowed(page),
        None => {
            defects.push(DataDefect::MissingPicturePage {
                character: owner.id.clone(),
                page: result,
            });
            fallback(owner, defects)
        }
    }
}

fn fallback<'a>(owner: &'a Character, defects: &mut Vec<DataDefect>) -> Cow<'a, PicturePage> {
    match owner.book.fallback_picture() {
        Some(page) => Cow::Borrowed(page),
        None => {
            defects.push(DataDefect::EmptyBook {
                character: owner.id.clone(),
            });
            Cow::Owned(PicturePage::blank())
        }
    }
}
