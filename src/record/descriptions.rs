use serde_json::{json, Map, Value};

/// `(field, english, german)` descriptions for every record field.
const FIELD_DESCRIPTIONS: &[(&str, &str, &str)] = &[
    (
        "call_id",
        "Unique identifier (UUID) of the call record.",
        "Eindeutige Kennung (UUID) des Anrufdatensatzes.",
    ),
    (
        "date",
        "Date of the call in ISO format (YYYY-MM-DD).",
        "Datum des Anrufs im ISO-Format (JJJJ-MM-TT).",
    ),
    (
        "weekday",
        "Weekday of the call as a three-letter label (Mon..Sun).",
        "Wochentag des Anrufs als Kürzel (Mon..Sun).",
    ),
    (
        "time_of_day_bucket",
        "Coarse time-of-day bucket the call fell into.",
        "Tageszeitfenster, in das der Anruf fiel.",
    ),
    (
        "agent_name",
        "Agent who handled the call.",
        "Agent, der den Anruf bearbeitet hat.",
    ),
    ("team", "Team of the handling agent.", "Team des bearbeitenden Agents."),
    (
        "agent_shift",
        "Shift the agent was working when the call arrived.",
        "Schicht des Agents zum Zeitpunkt des Anrufs.",
    ),
    (
        "customer_segment",
        "Customer segment of the caller.",
        "Kundensegment des Anrufers.",
    ),
    (
        "channel",
        "Interaction channel: voice (audio) or text (chat/messaging).",
        "Kanal: voice (Audio) oder text (Chat/Nachrichten).",
    ),
    (
        "language",
        "Language the customer used.",
        "Vom Kunden verwendete Sprache.",
    ),
    (
        "region",
        "Region or canton code of the customer.",
        "Region bzw. Kantonskürzel des Kunden.",
    ),
    (
        "device_type",
        "Device the customer used for the contact.",
        "Vom Kunden genutztes Gerät.",
    ),
    (
        "intent",
        "Main topic of the customer's request.",
        "Hauptthema des Kundenanliegens.",
    ),
    (
        "secondary_intents",
        "Further topics raised in the same call besides the main one; may be empty.",
        "Weitere Anliegen im selben Anruf neben dem Hauptanliegen; kann leer sein.",
    ),
    (
        "scenario",
        "Operational scenario describing the situation in the call.",
        "Operatives Szenario, das die Situation im Anruf beschreibt.",
    ),
    (
        "AWT",
        "Waiting time before the call was answered, in seconds.",
        "Wartezeit bis zur Annahme des Anrufs in Sekunden.",
    ),
    (
        "Hold_time",
        "Total time on hold, in seconds.",
        "Gesamte Haltezeit in Sekunden.",
    ),
    (
        "Transfers_count",
        "Number of transfers during the call.",
        "Anzahl der Weiterleitungen während des Anrufs.",
    ),
    (
        "Silence_ratio",
        "Share of the call spent in silence, in percent (0-100).",
        "Anteil der Stille am Anruf in Prozent (0-100).",
    ),
    (
        "Interruptions_count",
        "Number of interruptions between agent and customer.",
        "Anzahl der Unterbrechungen zwischen Agent und Kunde.",
    ),
    (
        "FCR",
        "First contact resolution: true when resolved in this contact.",
        "Erstlösung: true, wenn das Anliegen in diesem Kontakt gelöst wurde.",
    ),
    (
        "repeat_call_within_72h",
        "Customer called again within 72 hours.",
        "Kunde hat innerhalb von 72 Stunden erneut angerufen.",
    ),
    (
        "escalation",
        "Escalation path taken, or None.",
        "Gewählter Eskalationsweg oder None.",
    ),
    (
        "complaint_category",
        "Complaint raised by the customer, if any (nullable).",
        "Vom Kunden geäußerte Beschwerde, falls vorhanden (nullable).",
    ),
    (
        "NPS_score",
        "Net Promoter Score from 0 to 10.",
        "Net-Promoter-Score von 0 bis 10.",
    ),
    (
        "sentiment_score",
        "Customer sentiment in the range [-1, 1].",
        "Kundenstimmung im Bereich [-1, 1].",
    ),
    (
        "product",
        "Product the interaction was about (nullable).",
        "Produkt, um das es in der Interaktion ging (nullable).",
    ),
    (
        "amount_bucket",
        "Amount class of a financial operation (nullable).",
        "Betragsklasse einer Finanzoperation (nullable).",
    ),
    (
        "self_service_potential",
        "Estimated potential to solve the request via self-service.",
        "Geschätztes Potenzial, das Anliegen per Self-Service zu lösen.",
    ),
    (
        "automation_action_present",
        "Whether an automated action took place.",
        "Ob eine automatisierte Aktion stattfand.",
    ),
    (
        "automation_action_type",
        "Kind of automated action, if one took place (nullable).",
        "Art der automatisierten Aktion, falls vorhanden (nullable).",
    ),
    (
        "ANI",
        "Caller number (automatic number identification, E.164).",
        "Rufnummer des Anrufers (ANI, E.164).",
    ),
    (
        "compliance_flags",
        "Pass/fail result of the Greeting, Empathy, Summary and Farewell checks.",
        "Ergebnis (pass/fail) der Prüfungen Greeting, Empathy, Summary und Farewell.",
    ),
    (
        "kb_article_used",
        "Whether a knowledge base article was consulted.",
        "Ob ein Wissensdatenbank-Artikel verwendet wurde.",
    ),
    (
        "language_switch",
        "Whether the conversation switched language.",
        "Ob im Gespräch die Sprache gewechselt wurde.",
    ),
    (
        "pii_disclosure_flag",
        "Whether personal data was disclosed during the call.",
        "Ob im Anruf personenbezogene Daten offengelegt wurden.",
    ),
    (
        "script_adherence",
        "Adherence to the call script, in percent (0-100).",
        "Einhaltung des Gesprächsleitfadens in Prozent (0-100).",
    ),
    (
        "Silence_total_seconds",
        "Total silence across the call, in seconds.",
        "Gesamte Stille im Anruf in Sekunden.",
    ),
];

/// Record fields a dialogue prompt may interpolate as `{{field}}`.
pub const PROMPT_PLACEHOLDERS: &[&str] = &[
    "date",
    "weekday",
    "time_of_day_bucket",
    "channel",
    "language",
    "region",
    "agent_name",
    "agent_shift",
    "customer_segment",
    "intent",
    "secondary_intents",
    "scenario",
    "AWT",
    "Hold_time",
    "Transfers_count",
    "Silence_ratio",
    "Silence_total_seconds",
    "Interruptions_count",
    "FCR",
    "repeat_call_within_72h",
    "escalation",
    "complaint_category",
    "NPS_score",
    "sentiment_score",
    "product",
    "amount_bucket",
    "self_service_potential",
    "automation_action_present",
    "automation_action_type",
    "compliance_flags.Greeting",
    "compliance_flags.Empathy",
    "compliance_flags.Summary",
    "compliance_flags.Farewell",
    "kb_article_used",
    "language_switch",
    "pii_disclosure_flag",
    "script_adherence",
    "ANI",
];

const PROMPT_EN: &str = "\
You write a realistic contact-center transcript for a retail bank, based on the call metadata below.
- Setting: {{weekday}} {{date}}, {{time_of_day_bucket}}. Agent {{agent_name}} works the {{agent_shift}} shift. The call is held in {{language}}; if language_switch={{language_switch}} is true, the caller switches language once.
- Reflect intent {{intent}} and scenario {{scenario}} with concrete steps: verification without personal data, clarifying questions, next actions, confirmation. Further concerns raised in the same call: {{secondary_intents}}.
- Structure: greeting, clarification, investigation, resolution or escalation, summary, farewell.
- Channel {{channel}}: spoken turns for voice, short chat messages for text.
- Start with [wait {{AWT}}s]. Spread [hold Xs] to roughly {{Hold_time}} seconds and [silence Xs] to roughly {{Silence_total_seconds}} seconds ({{Silence_ratio}}% of the call).
- If Transfers_count={{Transfers_count}} is above zero, include a transfer. Interruptions_count={{Interruptions_count}} sets how often the caller cuts in.
- Compliance: Greeting={{compliance_flags.Greeting}}, Empathy={{compliance_flags.Empathy}}, Summary={{compliance_flags.Summary}}, Farewell={{compliance_flags.Farewell}} must be visible in the dialogue. The agent follows the script to about {{script_adherence}}%.
- Match tone to segment {{customer_segment}}, NPS {{NPS_score}} and sentiment {{sentiment_score}}. If FCR={{FCR}} is false or escalation={{escalation}} is not None, show that escalation. If repeat_call_within_72h={{repeat_call_within_72h}} is true, the caller refers to an earlier contact.
- Complaint category, if present: {{complaint_category}}. Product context, if present: {{product}} {{amount_bucket}}. Region {{region}}.
- Self-service potential is {{self_service_potential}}. If automation_action_present={{automation_action_present}} is true, the agent points to {{automation_action_type}}. If kb_article_used={{kb_article_used}} is true, the agent consults a knowledge base article.
- Caller ID {{ANI}} may appear. If pii_disclosure_flag={{pii_disclosure_flag}} is true, the caller starts to share personal data and the agent stops them; otherwise no personal data appears.
Output only lines prefixed with \"Agent:\" or \"Customer:\" plus the bracketed timing markers.";

const PROMPT_DE: &str = "\
Du schreibst ein realistisches Contact-Center-Transkript für eine Retailbank auf Basis der folgenden Anrufmetadaten.
- Rahmen: {{weekday}} {{date}}, {{time_of_day_bucket}}. Agent {{agent_name}} arbeitet in der Schicht {{agent_shift}}. Das Gespräch läuft auf {{language}}; ist language_switch={{language_switch}} true, wechselt der Anrufer einmal die Sprache.
- Anliegen {{intent}} und Szenario {{scenario}} mit konkreten Schritten abbilden: Verifizierung ohne personenbezogene Daten, Rückfragen, nächste Schritte, Bestätigung. Weitere Anliegen im selben Anruf: {{secondary_intents}}.
- Aufbau: Begrüßung, Klärung, Bearbeitung, Lösung oder Eskalation, Zusammenfassung, Verabschiedung.
- Kanal {{channel}}: gesprochene Turns bei voice, kurze Chatnachrichten bei text.
- Beginne mit [wait {{AWT}}s]. Verteile [hold Xs] auf etwa {{Hold_time}} Sekunden und [silence Xs] auf etwa {{Silence_total_seconds}} Sekunden ({{Silence_ratio}}% des Anrufs).
- Bei Transfers_count={{Transfers_count}} größer null eine Weiterleitung einbauen. Interruptions_count={{Interruptions_count}} bestimmt, wie oft der Anrufer unterbricht.
- Compliance: Greeting={{compliance_flags.Greeting}}, Empathy={{compliance_flags.Empathy}}, Summary={{compliance_flags.Summary}}, Farewell={{compliance_flags.Farewell}} müssen im Gespräch erkennbar sein. Der Agent hält sich zu etwa {{script_adherence}}% an den Leitfaden.
- Ton an Segment {{customer_segment}}, NPS {{NPS_score}} und Stimmung {{sentiment_score}} anpassen. Ist FCR={{FCR}} false oder escalation={{escalation}} nicht None, die Eskalation zeigen. Ist repeat_call_within_72h={{repeat_call_within_72h}} true, verweist der Anrufer auf einen früheren Kontakt.
- Beschwerdekategorie, falls vorhanden: {{complaint_category}}. Produktkontext, falls vorhanden: {{product}} {{amount_bucket}}. Region {{region}}.
- Self-Service-Potenzial ist {{self_service_potential}}. Ist automation_action_present={{automation_action_present}} true, verweist der Agent auf {{automation_action_type}}. Ist kb_article_used={{kb_article_used}} true, zieht der Agent einen Wissensdatenbank-Artikel heran.
- Die Anrufer-ID {{ANI}} darf vorkommen. Ist pii_disclosure_flag={{pii_disclosure_flag}} true, beginnt der Anrufer personenbezogene Daten zu nennen und der Agent unterbricht; sonst kommen keine personenbezogenen Daten vor.
Gib nur Zeilen mit dem Präfix \"Agent:\" oder \"Customer:\" sowie die Zeitmarker in eckigen Klammern aus.";

/// `{ field: { en, de } }` for every record field.
pub fn field_descriptions() -> Value {
    let mut map = Map::new();
    for (field, en, de) in FIELD_DESCRIPTIONS {
        map.insert(field.to_string(), json!({ "en": en, "de": de }));
    }
    Value::Object(map)
}

pub fn prompt_template() -> Value {
    json!({
        "placeholders": PROMPT_PLACEHOLDERS,
        "prompt_en": PROMPT_EN,
        "prompt_de": PROMPT_DE,
    })
}
