//! Agreement period lookup
//!
//! During an agreement period the patient's goal is frozen: no increase is
//! offered. Only the most recently recorded window counts; earlier windows are
//! not merged with it.

use crate::error::ComputeError;
use crate::store::DataAccess;
use chrono::NaiveDate;

/// Whether `date` falls inside the latest agreement window recorded on or before it
pub fn is_in_agreement<S>(store: &S, admission: &str, date: NaiveDate) -> Result<bool, ComputeError>
where
    S: DataAccess + ?Sized,
{
    Ok(store
        .agreement_window(admission, date)?
        .is_some_and(|window| window.contains(date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RecordCodes;
    use crate::store::MemoryStore;
    use crate::types::AgreementWindow;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn window(recorded: u32, start: u32, end: u32) -> AgreementWindow {
        AgreementWindow {
            date: day(recorded),
            start_date: day(start),
            end_date: day(end),
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new(RecordCodes::default());
        store.add_admission("adm", None);
        store
    }

    #[test]
    fn test_no_window() {
        assert!(!is_in_agreement(&store(), "adm", day(10)).unwrap());
    }

    #[test]
    fn test_inside_and_outside_window() {
        let mut store = store();
        store.write_agreement_window("adm", &window(1, 4, 17)).unwrap();

        assert!(is_in_agreement(&store, "adm", day(4)).unwrap());
        assert!(is_in_agreement(&store, "adm", day(17)).unwrap());
        assert!(!is_in_agreement(&store, "adm", day(18)).unwrap());
    }

    #[test]
    fn test_window_recorded_later_is_not_visible() {
        let mut store = store();
        store.write_agreement_window("adm", &window(12, 4, 17)).unwrap();
        assert!(!is_in_agreement(&store, "adm", day(11)).unwrap());
    }

    #[test]
    fn test_only_latest_window_is_consulted() {
        let mut store = store();
        store.write_agreement_window("adm", &window(1, 1, 20)).unwrap();
        // A newer window that does not cover the date hides the older one
        store.write_agreement_window("adm", &window(5, 25, 28)).unwrap();
        assert!(!is_in_agreement(&store, "adm", day(10)).unwrap());
    }
}
