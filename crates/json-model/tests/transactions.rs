mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{init_tracing, Person};
use json_model::{Document, EditOutcome, JsonModel};

fn count_changes(doc: &JsonModel, count: &Rc<Cell<usize>>) -> json_model::ObserverId {
    let count = count.clone();
    doc.add_change_observer(move |_| count.set(count.get() + 1))
}

#[test]
fn commit_notifies_and_rollback_restores() {
    init_tracing();
    let person = Person::new();
    let changes = Rc::new(Cell::new(0));
    let observer = count_changes(person.model(), &changes);

    person.first_name().set(String::from("John"));
    person.last_name().set(String::from("Doe"));

    person.model().begin_edit();
    person.first_name().set(String::from("Jane"));
    person.last_name().set(String::from("Smith"));
    assert_eq!(person.model().end_edit(false), EditOutcome::RolledBack);
    assert_eq!(changes.get(), 0);
    assert_eq!(person.first_name().get().as_deref(), Some("John"));
    assert_eq!(person.last_name().get().as_deref(), Some("Doe"));

    person.model().begin_edit();
    person.first_name().set(String::from("Jane"));
    person.last_name().set(String::from("Smith"));
    assert_eq!(person.model().end_edit(true), EditOutcome::Committed);
    assert_eq!(changes.get(), 1);
    assert_eq!(person.first_name().get().as_deref(), Some("Jane"));

    changes.set(0);
    assert!(person.model().remove_change_observer(observer));
    person.model().begin_edit();
    person.first_name().set(String::from("John"));
    person.last_name().set(String::from("Doe"));
    assert_eq!(person.model().end_edit(true), EditOutcome::Committed);
    assert_eq!(changes.get(), 0);
    assert_eq!(person.first_name().get().as_deref(), Some("John"));
}

#[test]
fn rollback_restores_scalar_without_notification() {
    init_tracing();
    let person = Person::named("Ann", "Lee");
    person.age().set(30);
    let changes = Rc::new(Cell::new(0));
    count_changes(person.model(), &changes);

    person.model().begin_edit();
    person.age().set(31);
    person.age().undefine();
    person.last_name().set(None);
    person.model().end_edit(false);

    assert_eq!(person.age().get(), Some(30));
    assert_eq!(person.last_name().get().as_deref(), Some("Lee"));
    assert_eq!(changes.get(), 0);
}

#[test]
fn commit_keeps_mutations_made_through_an_alias_before_the_edit() {
    init_tracing();
    let a = Person::named("A", "Root");
    let b = Person::named("B", "Leaf");
    a.relative().set(b.clone());
    let changes = Rc::new(Cell::new(0));
    count_changes(a.model(), &changes);

    b.age().set(9);
    a.model().begin_edit();
    a.first_name().set(String::from("A2"));
    assert_eq!(a.model().end_edit(true), EditOutcome::Committed);

    assert_eq!(changes.get(), 1);
    assert_eq!(a.first_name().get().as_deref(), Some("A2"));
    assert_eq!(a.relative().get().unwrap().age().get(), Some(9));
    assert!(a.relative().get().unwrap().model().is_same_instance(b.model()));
}

#[test]
fn multi_level_edits() {
    init_tracing();
    let john = Person::named("John", "Doe");
    let jane = Person::named("Jane", "Smith");
    let changes = Rc::new(Cell::new(0));
    count_changes(john.model(), &changes);

    john.model().begin_edit();
    john.relative().set(jane.clone());
    john.model().end_edit(true);
    assert_eq!(changes.get(), 1);
    assert_eq!(john.relative().get(), Some(jane.clone()));

    // The relative is jane herself.
    jane.last_name().set(String::from("Doe"));
    assert_eq!(john.relative().get().unwrap().last_name().get().as_deref(), Some("Doe"));
    john.relative().get().unwrap().last_name().set(String::from("Smith"));
    assert_eq!(jane.last_name().get().as_deref(), Some("Smith"));

    // Editing jane is editing john's relative.
    count_changes(jane.model(), &changes);
    jane.model().begin_edit();
    jane.last_name().set(String::from("Doe"));
    assert_eq!(john.relative().get().unwrap().last_name().get().as_deref(), Some("Doe"));
    jane.model().end_edit(true);
    assert_eq!(changes.get(), 2);
    john.relative().get().unwrap().last_name().set(String::from("Smith"));
    assert_eq!(jane.last_name().get().as_deref(), Some("Smith"));

    // Rolling back jane restores her content in place; john still sees her.
    changes.set(0);
    jane.model().begin_edit();
    jane.last_name().set(String::from("Doe"));
    jane.model().end_edit(false);
    assert_eq!(changes.get(), 0);
    assert_eq!(john.relative().get().unwrap().last_name().get().as_deref(), Some("Smith"));
    assert_eq!(john.relative().get(), Some(jane.clone()));
    jane.last_name().set(String::from("Doe"));
    assert_eq!(john.relative().get().unwrap().last_name().get().as_deref(), Some("Doe"));

    // Rolling back john replaces his content with the snapshot, which holds
    // a copy of jane: jane is orphaned from john.
    john.model().begin_edit();
    jane.model().begin_edit();
    jane.last_name().set(String::from("Smith"));
    jane.model().end_edit(true);
    assert_eq!(changes.get(), 1);
    assert_eq!(john.relative().get().unwrap().last_name().get().as_deref(), Some("Smith"));
    assert_eq!(john.relative().get(), Some(jane.clone()));

    assert_eq!(john.model().end_edit(false), EditOutcome::RolledBack);
    assert_eq!(changes.get(), 1);
    assert_eq!(jane.last_name().get().as_deref(), Some("Smith"));
    assert_eq!(john.relative().get().unwrap().last_name().get().as_deref(), Some("Doe"));
    assert_ne!(john.relative().get(), Some(jane.clone()));

    // Nested edits on the new relative notify both levels.
    changes.set(0);
    let relative = john.relative().get().unwrap();
    count_changes(relative.model(), &changes);
    john.model().begin_edit();
    john.relative().get().unwrap().model().begin_edit();
    john.relative().get().unwrap().last_name().set(String::from("Smith"));
    john.relative().get().unwrap().model().end_edit(true);
    john.model().end_edit(true);
    assert_eq!(changes.get(), 2);
    assert_eq!(jane.last_name().get().as_deref(), Some("Smith"));
    assert_eq!(john.relative().get().unwrap().last_name().get().as_deref(), Some("Smith"));
    assert_eq!(john.relative().get(), Some(jane.clone()));
    assert!(!relative.model().shares_store_with(jane.model()));
}

#[test]
fn deserialize_replaces_content_in_place() {
    init_tracing();
    let parent = Person::named("P", "Q");
    let child = Person::named("C", "Q");
    parent.relative().set(child.clone());

    child
        .model()
        .deserialize(r#"{"firstName":"Z","age":1}"#)
        .unwrap();
    assert_eq!(child.first_name().get().as_deref(), Some("Z"));
    assert!(child.last_name().is_undefined());
    assert_eq!(parent.relative().get().unwrap().age().get(), Some(1));

    let before = parent.json();
    let err = child.model().deserialize("{\"firstName\":").unwrap_err();
    assert!(err.is_parse_error());
    assert_eq!(parent.json(), before);
}

#[test]
fn begin_edit_twice_takes_a_fresh_snapshot() {
    init_tracing();
    let doc = JsonModel::from_json_str(r#"{"v": 1}"#).unwrap();
    let v = doc.define_property::<i64>("v");
    doc.begin_edit();
    v.set(2);
    doc.begin_edit();
    v.set(3);
    assert_eq!(doc.end_edit(false), EditOutcome::RolledBack);
    assert_eq!(v.get(), Some(2));
    assert_eq!(doc.end_edit(false), EditOutcome::NotEditing);
}

/// A document that records when it is saved.
#[derive(Clone)]
struct Journal {
    model: JsonModel,
    log: Rc<RefCell<Vec<&'static str>>>,
}

impl PartialEq for Journal {
    fn eq(&self, other: &Self) -> bool {
        self.model == other.model
    }
}

impl Document for Journal {
    fn from_model(model: JsonModel) -> Self {
        Journal {
            model,
            log: Rc::default(),
        }
    }

    fn model(&self) -> &JsonModel {
        &self.model
    }

    fn save(&self) {
        self.log.borrow_mut().push("save");
    }
}

#[test]
fn commit_saves_before_notifying() {
    init_tracing();
    let journal = Journal::new();
    let log = journal.log.clone();
    journal
        .model()
        .add_change_observer(move |_| log.borrow_mut().push("notify"));

    journal.model().begin_edit();
    journal.model().set_value("entry", 1);
    assert_eq!(journal.end_edit(true), EditOutcome::Committed);
    assert_eq!(*journal.log.borrow(), ["save", "notify"]);

    journal.model().begin_edit();
    journal.model().set_value("entry", 2);
    assert_eq!(journal.end_edit(false), EditOutcome::RolledBack);
    journal.model().begin_edit();
    assert_eq!(journal.end_edit(true), EditOutcome::Unchanged);
    assert_eq!(journal.end_edit(true), EditOutcome::NotEditing);
    assert_eq!(*journal.log.borrow(), ["save", "notify"]);

    // Ending through the untyped handle skips the hook.
    journal.model().begin_edit();
    journal.model().set_value("entry", 3);
    assert_eq!(journal.model().end_edit(true), EditOutcome::Committed);
    assert_eq!(*journal.log.borrow(), ["save", "notify", "notify"]);
}
