#![allow(dead_code)]

use modulation_check::config::Config;
use modulation_check::ingest::parse_csv;
use modulation_check::session::{Session, SessionId};

pub const WEEKLY_V1: &str = "\
Intervenant;Hres contrat;Total heures;Semaine du
A;20:00;35:00;06/01/2025
B;30,0;34;06/01/2025
C;35:00;41:30;06/01/2025
D;24;32,5;06/01/2025
E;20;-2;06/01/2025
Somme;129;177;
";

pub const MONTHLY_V1: &str = "\
Intervenant;Secteur;Déviation mois;Déviation cumulée;Hres potentielles restantes
A;IDF01;6;10,5;12
B;IDF02;-3;-4:30;8
C;IDF01;2;1;0
Total secteur;;5;7;20
";

pub fn session_with(weekly: Option<&str>, monthly: Option<&str>) -> Session {
    let cfg = Config::default();
    let mut s = Session::new(SessionId::new("test"), &cfg);
    if let Some(m) = monthly {
        s.load_monthly(&parse_csv(m, ';').unwrap()).unwrap();
    }
    if let Some(w) = weekly {
        s.load_weekly(&parse_csv(w, ';').unwrap()).unwrap();
    }
    s
}
