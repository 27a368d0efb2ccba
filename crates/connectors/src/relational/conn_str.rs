/// Substitute the `$driver`, `$hostname`, `$database`, `$spn` and `$uid`
/// placeholders of a configured ODBC connection-string template.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.to_string();
    for (key, value) in vars {
        rendered = rendered.replace(&format!("${key}"), value);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_all_placeholders() {
        let template =
            "Driver=$driver;Server=$hostname;Database=$database;ServerSPN=$spn;UID=$uid";
        let rendered = render_template(
            template,
            &[
                ("driver", "{PostgreSQL Unicode}"),
                ("hostname", "db.example.test"),
                ("database", "sales"),
                ("spn", "postgres/db.example.test"),
                ("uid", "svc_virt"),
            ],
        );
        assert_eq!(
            rendered,
            "Driver={PostgreSQL Unicode};Server=db.example.test;Database=sales;\
             ServerSPN=postgres/db.example.test;UID=svc_virt"
        );
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        assert_eq!(render_template("x=$other", &[("uid", "u")]), "x=$other");
    }
}
