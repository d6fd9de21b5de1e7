use crate::sim::SimTime;

#[test]
fn unit_conversions() {
    assert_eq!(SimTime::from_hours(2.0), SimTime(120.0));
    assert_eq!(SimTime::from_days(1.0), SimTime(1440.0));
    assert_eq!(SimTime::from_days(160.0).as_days(), 160.0);
    assert_eq!(SimTime::from_minutes(7.5).as_minutes(), 7.5);
}

#[test]
fn ordering_is_total() {
    let mut times = vec![SimTime(3.0), SimTime::ZERO, SimTime(1.5)];
    times.sort();
    assert_eq!(times, vec![SimTime::ZERO, SimTime(1.5), SimTime(3.0)]);
    assert!(SimTime(1.0) < SimTime(1.0 + 1e-9));
}

#[test]
fn since_never_negative() {
    assert_eq!(SimTime(10.0).since(SimTime(4.0)), 6.0);
    assert_eq!(SimTime(4.0).since(SimTime(10.0)), 0.0);
    assert_eq!(SimTime(4.0).after(2.5), SimTime(6.5));
}

#[test]
fn validity() {
    assert!(SimTime::ZERO.is_valid());
    assert!(!SimTime(-1.0).is_valid());
    assert!(!SimTime(f64::NAN).is_valid());
    assert!(!SimTime(f64::INFINITY).is_valid());
}

#[test]
fn display_in_minutes() {
    assert_eq!(SimTime(12.345).to_string(), "12.35min");
}
