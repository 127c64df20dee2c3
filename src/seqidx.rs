use rustc_hash::FxHashMap;

/// Interns sequence names seen in alignment files, with their lengths.
#[derive(Debug, Default)]
pub struct SequenceIndex {
    name_to_id: FxHashMap<String, u32>,
    id_to_name: Vec<String>,
    id_to_len: Vec<Option<usize>>,
}

impl SequenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_id(&mut self, name: &str, length: Option<usize>) -> u32 {
        if let Some(&id) = self.name_to_id.get(name) {
            if let Some(length) = length {
                self.id_to_len[id as usize].get_or_insert(length);
            }
            return id;
        }
        let id = self.id_to_name.len() as u32;
        self.name_to_id.insert(name.to_owned(), id);
        self.id_to_name.push(name.to_owned());
        self.id_to_len.push(length);
        id
    }

    pub fn get_id(&self, name: &str) -> Option<u32> {
        self.name_to_id.get(name).copied()
    }

    pub fn get_name(&self, id: u32) -> Option<&str> {
        self.id_to_name.get(id as usize).map(String::as_str)
    }

    pub fn get_len_from_id(&self, id: u32) -> Option<usize> {
        self.id_to_len.get(id as usize).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}
