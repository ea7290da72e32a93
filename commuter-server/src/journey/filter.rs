//! Selecting and ordering the runs that serve an origin/destination pair.

use chrono::{DateTime, Utc};

use crate::domain::{HELSINKI, PASILA, StationCode, TrainRun};

/// Keeps the commuter runs that travel from `origin` to `destination`.
///
/// Each surviving run is trimmed to start at its first row at `origin` and
/// the result is ordered by the effective time of the leg's origin
/// departure, the row [`leg_rows`] picks. The input is never modified; the
/// returned runs are new values.
pub fn filter_and_slice(
    runs: &[TrainRun],
    origin: &StationCode,
    destination: &StationCode,
) -> Vec<TrainRun> {
    let origin = origin.as_str();
    let destination = destination.as_str();

    let mut journeys: Vec<TrainRun> = runs
        .iter()
        .filter(|run| run.is_commuter())
        .filter_map(|run| slice_from_origin(run, origin))
        .filter_map(|run| accept(run, origin, destination))
        .collect();

    // Stable, so equal departure times keep feed order
    journeys.sort_by_key(|run| departure_time(run, origin, destination));
    journeys
}

/// Whether `run` departs `origin` and later arrives at `destination`.
///
/// Loop services can depart the origin more than once. The most recent
/// origin departure seen so far is what a later destination arrival is
/// compared against.
pub fn is_valid_journey(run: &TrainRun, origin: &str, destination: &str) -> bool {
    leg_rows(run, origin, destination).is_some()
}

/// Row indices of the leg's origin departure and destination arrival.
///
/// Scans the rows once, tracking the latest origin departure, and stops at
/// the first destination arrival scheduled strictly after it.
pub fn leg_rows(run: &TrainRun, origin: &str, destination: &str) -> Option<(usize, usize)> {
    let mut last_departure: Option<usize> = None;

    for (idx, row) in run.time_table_rows.iter().enumerate() {
        if row.is_departure_from(origin) {
            last_departure = Some(idx);
        } else if row.is_arrival_at(destination)
            && let Some(dep) = last_departure
            && row.scheduled_time > run.time_table_rows[dep].scheduled_time
        {
            return Some((dep, idx));
        }
    }

    None
}

/// Drops every row before the first one at `origin`.
fn slice_from_origin(run: &TrainRun, origin: &str) -> Option<TrainRun> {
    let start = run.first_row_at(origin)?;
    Some(run.with_rows(run.time_table_rows[start..].to_vec()))
}

fn accept(run: TrainRun, origin: &str, destination: &str) -> Option<TrainRun> {
    if origin == PASILA && destination == HELSINKI {
        return collapse_pasila_to_helsinki(&run);
    }
    is_valid_journey(&run, origin, destination).then_some(run)
}

/// Pasila → Helsinki on ring-line services.
///
/// Ring trains leave Pasila outbound, circle the airport loop and come back
/// through Pasila into Helsinki. The generic scan cannot tell the outbound
/// Pasila departure from the returning one, so this route uses the last
/// Pasila departure and the last Helsinki arrival and keeps only those two
/// rows. Not applied to any other station pair.
pub fn collapse_pasila_to_helsinki(run: &TrainRun) -> Option<TrainRun> {
    let rows = &run.time_table_rows;
    let departure = rows.iter().rposition(|row| row.is_departure_from(PASILA))?;
    let arrival = rows.iter().rposition(|row| row.is_arrival_at(HELSINKI))?;

    if rows[departure].scheduled_time >= rows[arrival].scheduled_time {
        return None;
    }

    Some(run.with_rows(vec![rows[departure].clone(), rows[arrival].clone()]))
}

/// Effective time of the leg's origin departure.
///
/// On loop services that is the latest origin departure before the
/// destination arrival. Runs without such a leg fall back to their first
/// origin departure, then to their first row.
pub fn departure_time(run: &TrainRun, origin: &str, destination: &str) -> Option<DateTime<Utc>> {
    let rows = &run.time_table_rows;
    leg_rows(run, origin, destination)
        .map(|(dep, _)| &rows[dep])
        .or_else(|| run.first_departure_from(origin))
        .or_else(|| rows.first())
        .map(|row| row.effective_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RowType::{Arrival, Departure};
    use crate::journey::fixtures::{at, code, make_run, ring_run};

    #[test]
    fn keeps_simple_forward_journey() {
        let run = make_run(
            "9601",
            "K",
            &[
                ("HKI", Departure, "10:00", "6"),
                ("PSL", Arrival, "10:05", "3"),
                ("PSL", Departure, "10:06", "3"),
                ("TKL", Arrival, "10:20", "2"),
            ],
        );

        let result = filter_and_slice(&[run.clone()], &code("HKI"), &code("TKL"));
        assert_eq!(result, vec![run]);
    }

    #[test]
    fn drops_non_commuter_runs() {
        let mut run = make_run(
            "45",
            "IC",
            &[("HKI", Departure, "10:00", "9"), ("TPE", Arrival, "11:40", "1")],
        );
        run.train_category = "Long-distance".into();

        assert!(filter_and_slice(&[run], &code("HKI"), &code("TPE")).is_empty());
    }

    #[test]
    fn drops_run_without_origin() {
        let run = make_run(
            "9601",
            "K",
            &[("PSL", Departure, "10:06", "3"), ("TKL", Arrival, "10:20", "2")],
        );

        assert!(filter_and_slice(&[run], &code("HKI"), &code("TKL")).is_empty());
    }

    #[test]
    fn drops_run_that_only_arrives_at_origin() {
        let run = make_run(
            "9601",
            "K",
            &[("TKL", Departure, "10:00", "2"), ("HKI", Arrival, "10:20", "7")],
        );

        assert!(filter_and_slice(&[run], &code("HKI"), &code("TKL")).is_empty());
    }

    #[test]
    fn drops_run_going_the_other_way() {
        // Destination arrival comes before the origin departure
        let run = make_run(
            "9602",
            "K",
            &[
                ("TKL", Departure, "10:00", "2"),
                ("PSL", Arrival, "10:14", "4"),
                ("PSL", Departure, "10:15", "4"),
                ("HKI", Arrival, "10:20", "7"),
            ],
        );

        assert!(filter_and_slice(&[run], &code("PSL"), &code("TKL")).is_empty());
    }

    #[test]
    fn slices_rows_before_first_origin_occurrence() {
        let run = make_run(
            "9603",
            "K",
            &[
                ("KE", Departure, "09:30", "1"),
                ("TKL", Arrival, "09:50", "2"),
                ("TKL", Departure, "09:51", "2"),
                ("PSL", Arrival, "10:05", "3"),
                ("PSL", Departure, "10:06", "3"),
                ("HKI", Arrival, "10:11", "8"),
            ],
        );

        let result = filter_and_slice(&[run], &code("TKL"), &code("HKI"));
        assert_eq!(result.len(), 1);
        let rows = &result[0].time_table_rows;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].station_short_code, *"TKL");
        assert_eq!(rows[0].row_type, Arrival);
    }

    #[test]
    fn uses_latest_origin_departure_on_loops() {
        // Departs PSL, loops back to PSL, departs again, then reaches TKL
        let run = make_run(
            "8501",
            "I",
            &[
                ("PSL", Departure, "10:00", "1"),
                ("LEN", Arrival, "10:30", "2"),
                ("LEN", Departure, "10:31", "2"),
                ("PSL", Arrival, "10:55", "3"),
                ("PSL", Departure, "10:56", "3"),
                ("TKL", Arrival, "11:10", "1"),
            ],
        );

        let (dep, arr) = leg_rows(&run, "PSL", "TKL").unwrap();
        assert_eq!(dep, 4);
        assert_eq!(arr, 5);
    }

    #[test]
    fn rejects_arrival_not_after_departure() {
        // Equal timestamps do not count as "after"
        let run = make_run(
            "9604",
            "K",
            &[("HKI", Departure, "10:00", "1"), ("PSL", Arrival, "10:00", "2")],
        );

        assert!(!is_valid_journey(&run, "HKI", "PSL"));
    }

    #[test]
    fn sorts_by_effective_departure() {
        let early = make_run(
            "1",
            "K",
            &[("HKI", Departure, "10:00", "1"), ("PSL", Arrival, "10:05", "1")],
        );
        let mut delayed = make_run(
            "2",
            "K",
            &[("HKI", Departure, "09:55", "2"), ("PSL", Arrival, "10:00", "2")],
        );
        delayed.time_table_rows[0].live_estimate_time = Some(at(10, 7));
        let late = make_run(
            "3",
            "K",
            &[("HKI", Departure, "10:03", "3"), ("PSL", Arrival, "10:08", "3")],
        );

        let result = filter_and_slice(&[delayed, late, early], &code("HKI"), &code("PSL"));
        let order: Vec<&str> = result.iter().map(|r| r.train_number.as_str()).collect();
        assert_eq!(order, vec!["1", "3", "2"]);
    }

    #[test]
    fn equal_departures_keep_feed_order() {
        let a = make_run(
            "20",
            "K",
            &[("HKI", Departure, "10:00", "1"), ("PSL", Arrival, "10:05", "1")],
        );
        let b = make_run(
            "10",
            "K",
            &[("HKI", Departure, "10:00", "2"), ("PSL", Arrival, "10:05", "2")],
        );

        let result = filter_and_slice(&[a, b], &code("HKI"), &code("PSL"));
        assert_eq!(result[0].train_number, "20");
        assert_eq!(result[1].train_number, "10");
    }

    #[test]
    fn pasila_to_helsinki_collapses_to_two_rows() {
        let run = make_run(
            "8702",
            "P",
            &[
                ("PSL", Departure, "10:00", "3"),
                ("HKI", Arrival, "10:05", "8"),
            ],
        );

        let result = filter_and_slice(&[run], &code("PSL"), &code("HKI"));
        assert_eq!(result.len(), 1);
        let rows = &result[0].time_table_rows;
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_departure_from("PSL"));
        assert_eq!(rows[0].commercial_track, "3");
        assert!(rows[1].is_arrival_at("HKI"));
        assert_eq!(rows[1].commercial_track, "8");
    }

    #[test]
    fn pasila_to_helsinki_uses_last_visits_of_ring_train() {
        let run = ring_run("8703");
        let result = filter_and_slice(&[run], &code("PSL"), &code("HKI"));

        assert_eq!(result.len(), 1);
        let rows = &result[0].time_table_rows;
        assert_eq!(rows.len(), 2);
        // The returning Pasila departure, not the outbound one
        assert_eq!(rows[0].scheduled_time, at(11, 0));
        assert_eq!(rows[1].scheduled_time, at(11, 5));
    }

    #[test]
    fn pasila_to_helsinki_rejects_inverted_order() {
        let run = make_run(
            "8704",
            "P",
            &[
                ("PSL", Departure, "10:00", "3"),
                ("HKI", Arrival, "09:55", "8"),
            ],
        );
        assert!(filter_and_slice(&[run], &code("PSL"), &code("HKI")).is_empty());

        let same_minute = make_run(
            "8705",
            "P",
            &[
                ("PSL", Departure, "10:00", "3"),
                ("HKI", Arrival, "10:00", "8"),
            ],
        );
        assert!(filter_and_slice(&[same_minute], &code("PSL"), &code("HKI")).is_empty());
    }

    #[test]
    fn pasila_to_helsinki_rejects_outbound_only_run() {
        // Leaves Helsinki, passes Pasila and never comes back
        let run = make_run(
            "9605",
            "K",
            &[
                ("HKI", Departure, "10:00", "6"),
                ("PSL", Arrival, "10:05", "3"),
                ("PSL", Departure, "10:06", "3"),
                ("KE", Arrival, "10:40", "2"),
            ],
        );
        assert!(filter_and_slice(&[run], &code("PSL"), &code("HKI")).is_empty());
    }

    #[test]
    fn special_case_is_not_applied_in_reverse() {
        // HKI -> PSL uses the generic scan, so all rows are kept
        let run = ring_run("8706");
        let result = filter_and_slice(&[run.clone()], &code("HKI"), &code("PSL"));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].time_table_rows, run.time_table_rows);
    }

    #[test]
    fn input_is_not_mutated() {
        let runs = vec![ring_run("8707")];
        let before = runs.clone();
        let _ = filter_and_slice(&runs, &code("PSL"), &code("HKI"));
        assert_eq!(runs, before);
    }

    #[test]
    fn empty_runs_yield_empty_result() {
        let run = make_run("1", "K", &[]);
        assert!(filter_and_slice(&[run], &code("HKI"), &code("PSL")).is_empty());
        assert!(filter_and_slice(&[], &code("HKI"), &code("PSL")).is_empty());
    }

    #[test]
    fn departure_time_falls_back_without_a_leg() {
        let run = make_run("1", "K", &[("HKI", Arrival, "10:00", "1")]);
        assert_eq!(departure_time(&run, "HKI", "PSL"), Some(at(10, 0)));
        let outbound = make_run(
            "2",
            "K",
            &[("HKI", Departure, "10:00", "1"), ("KE", Arrival, "10:40", "1")],
        );
        assert_eq!(departure_time(&outbound, "HKI", "PSL"), Some(at(10, 0)));
        let empty = make_run("3", "K", &[]);
        assert_eq!(departure_time(&empty, "HKI", "PSL"), None);
    }

    #[test]
    fn loop_runs_sort_by_the_departure_of_their_leg() {
        // Leaves HKI at 10:00, comes back round and leaves again at 10:40
        // before reaching LPV
        let looping = make_run(
            "8801",
            "I",
            &[
                ("HKI", Departure, "10:00", "1"),
                ("LEN", Arrival, "10:20", "2"),
                ("LEN", Departure, "10:21", "2"),
                ("HKI", Arrival, "10:38", "4"),
                ("HKI", Departure, "10:40", "4"),
                ("LPV", Arrival, "10:50", "1"),
            ],
        );
        let direct = make_run(
            "9601",
            "K",
            &[("HKI", Departure, "10:20", "6"), ("LPV", Arrival, "10:30", "1")],
        );

        let result = filter_and_slice(&[looping, direct], &code("HKI"), &code("LPV"));
        let order: Vec<&str> = result.iter().map(|r| r.train_number.as_str()).collect();
        assert_eq!(order, vec!["9601", "8801"]);
        assert_eq!(departure_time(&result[1], "HKI", "LPV"), Some(at(10, 40)));
    }
}
