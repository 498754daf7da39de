use crate::engine::Outcome;
use crate::model::Snapshot;
use crate::stats;

pub fn display_details(snapshot: &Snapshot, outcome: &Outcome) {
    let mut laboratories = outcome.laboratories.iter().collect::<Vec<_>>();
    laboratories.sort_by_key(|l| l.name.clone());
    for lab in laboratories {
        if lab.assigned.is_empty() {
            continue;
        }
        print!("{} ({}/{})", lab.name, lab.assigned.len(), lab.capacity);
        if let Some(tag) = &lab.field_tag {
            print!(" [{tag}]");
        }
        println!(":");
        let mut students = lab
            .assigned
            .iter()
            .filter_map(|key| snapshot.student_by_key(key))
            .map(|s| (snapshot.student(s), &outcome.entries[s.0]))
            .collect::<Vec<_>>();
        students.sort_by(|(x, _), (y, _)| x.name.cmp(&y.name));
        for (student, entry) in students {
            print!("  - {student}");
            if let Some(gpa) = student.gpa {
                print!(" GPA {gpa:.2}");
            }
            if let Some(rank) = entry.rank {
                print!(" (rank {rank}, satisfaction {}%)", entry.satisfaction);
            }
            if entry.special_admission {
                print!(" (special admission)");
            }
            println!();
        }
        println!();
    }
}

pub fn display_stats(snapshot: &Snapshot, outcome: &Outcome) {
    let students = snapshot.students.len();
    let lazy = snapshot.students.iter().filter(|s| s.is_lazy()).count();
    println!(
        "Students with/without preferences/total: {}/{}/{}",
        students - lazy,
        lazy,
        students
    );
    let ranks = stats::statistics(outcome);
    let cumul = ranks.iter().scan(0, |s, &r| {
        *s += r;
        Some(*s)
    });
    println!("Final ranking:");
    for (rank, (n, c)) in ranks.iter().zip(cumul).enumerate() {
        if *n != 0 {
            println!(
                "  - rank {}: {} (cumulative {} - {:.2}%)",
                rank + 1,
                n,
                c,
                100.0 * c as f32 / students as f32
            );
        }
    }
    let special = outcome.entries.iter().filter(|e| e.special_admission).count();
    if special > 0 {
        println!("  - special admission: {special}");
    }
    println!(
        "Mean satisfaction: {:.1}%",
        stats::mean_satisfaction(outcome)
    );
}

pub fn display_unassigned(snapshot: &Snapshot, outcome: &Outcome) {
    let mut unassigned = outcome
        .unassigned()
        .filter_map(|e| snapshot.student_by_key(&e.student_id))
        .map(|s| snapshot.student(s))
        .collect::<Vec<_>>();
    unassigned.sort_by(|x, y| x.cmp_gpa(y));
    if !unassigned.is_empty() {
        println!("Unassigned students:");
        for student in unassigned {
            println!("  - {student}");
        }
    }
}

pub fn display_empty(outcome: &Outcome) {
    let mut laboratories = outcome
        .laboratories
        .iter()
        .filter(|l| l.assigned.is_empty())
        .collect::<Vec<_>>();
    laboratories.sort_by_key(|l| l.name.clone());
    if !laboratories.is_empty() {
        println!("Empty laboratories:");
        for lab in laboratories {
            println!("  - {}", lab.name);
        }
    }
}

pub fn display_anomalies(outcome: &Outcome) {
    if !outcome.anomalies.is_empty() {
        println!("Anomalies:");
        for anomaly in &outcome.anomalies {
            println!("  - {anomaly}");
        }
    }
}
